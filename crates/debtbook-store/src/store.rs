use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use debtbook_types::{
    validate_amount, validate_description, validate_name, Debt, DebtId, DebtRow, Debtor, DebtorId,
    DebtorRow, NewDebt, NewDebtor, NewPayment, Payment, PaymentId, PaymentRow,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{LedgerError, LedgerResult, StorageError, StorageResult};
use crate::traits::LedgerBackend;
use crate::view::{LedgerView, Phase};

/// Owner of the in-memory ledger view.
///
/// Every operation goes to the collaborator first and only touches the view
/// once the collaborator has answered, so a failed call never leaves a
/// partial update behind. Mutations take `&mut self`: one store serves one
/// caller, one operation at a time.
pub struct LedgerStore {
    backend: Arc<dyn LedgerBackend>,
    config: StoreConfig,
    view: watch::Sender<LedgerView>,
}

impl LedgerStore {
    pub fn new(backend: Arc<dyn LedgerBackend>, config: StoreConfig) -> Self {
        let (view, _) = watch::channel(LedgerView::default());
        Self {
            backend,
            config,
            view,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// A copy of the current view.
    pub fn view(&self) -> LedgerView {
        self.view.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.view.borrow().phase
    }

    pub fn debtor(&self, id: &DebtorId) -> Option<Debtor> {
        self.view.borrow().debtor(id).cloned()
    }

    /// Receive every published change to the view, including phase
    /// transitions.
    pub fn subscribe(&self) -> watch::Receiver<LedgerView> {
        self.view.subscribe()
    }

    /// Fetch the whole ledger and replace the view.
    ///
    /// On failure the debtor list keeps its previous contents, the phase
    /// becomes [`Phase::Error`], and the error is returned and published.
    pub async fn load_all(&mut self) -> LedgerResult<()> {
        let pending = self.begin(Phase::Loading);
        let result = self.fetch_ledger().await;
        pending.disarm();
        match result {
            Ok(debtors) => {
                info!(debtors = debtors.len(), "ledger loaded");
                self.view.send_modify(|view| {
                    view.debtors = debtors;
                    view.phase = Phase::Ready;
                    view.error = None;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "ledger load failed");
                self.surface(Phase::Error, &e);
                Err(e.into())
            }
        }
    }

    pub async fn create_debtor(&mut self, name: &str) -> LedgerResult<Debtor> {
        self.ensure_ready()?;
        let insert = NewDebtor {
            name: validate_name(name).map_err(LedgerError::Invalid)?,
            owner_ref: self.config.owner.clone(),
        };

        let pending = self.begin(Phase::Mutating);
        let result = self.persist_debtor(&insert).await;
        let debtor = self.settle(pending, result, |view, debtor| {
            Debtor::insert_into(&mut view.debtors, debtor.clone());
        })?;
        info!(debtor = %debtor.id, name = %debtor.name, "debtor created");
        Ok(debtor)
    }

    pub async fn create_debt(
        &mut self,
        debtor_id: &DebtorId,
        description: &str,
        amount: f64,
    ) -> LedgerResult<Debt> {
        self.ensure_ready()?;
        let insert = NewDebt {
            debtor_id: debtor_id.clone(),
            description: validate_description(description).map_err(LedgerError::Invalid)?,
            amount: validate_amount(amount).map_err(LedgerError::Invalid)?,
        };
        self.ensure_debtor(debtor_id)?;

        let pending = self.begin(Phase::Mutating);
        let result = self.persist_debt(&insert).await;
        let debt = self.settle(pending, result, |view, debt| {
            if let Some(debtor) = view.debtor_mut(debtor_id) {
                debtor.insert_debt(debt.clone());
            }
        })?;
        info!(debtor = %debtor_id, debt = %debt.id, amount = debt.amount, "debt recorded");
        Ok(debt)
    }

    /// Record a payment dated now.
    pub async fn create_payment(
        &mut self,
        debtor_id: &DebtorId,
        amount: f64,
        notes: Option<&str>,
    ) -> LedgerResult<Payment> {
        self.create_payment_at(debtor_id, amount, notes, Utc::now())
            .await
    }

    /// Record a payment with an explicit payment date.
    pub async fn create_payment_at(
        &mut self,
        debtor_id: &DebtorId,
        amount: f64,
        notes: Option<&str>,
        date: DateTime<Utc>,
    ) -> LedgerResult<Payment> {
        self.ensure_ready()?;
        let insert = NewPayment {
            debtor_id: debtor_id.clone(),
            amount: validate_amount(amount).map_err(LedgerError::Invalid)?,
            date,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };
        self.ensure_debtor(debtor_id)?;

        let pending = self.begin(Phase::Mutating);
        let result = self.persist_payment(&insert).await;
        let payment = self.settle(pending, result, |view, payment| {
            if let Some(debtor) = view.debtor_mut(debtor_id) {
                debtor.insert_payment(payment.clone());
            }
        })?;
        info!(debtor = %debtor_id, payment = %payment.id, amount = payment.amount, "payment recorded");
        Ok(payment)
    }

    /// Delete a debtor together with its debts and payments.
    ///
    /// Returns whether the debtor was in the view. Unknown ids are not an
    /// error.
    pub async fn delete_debtor(&mut self, debtor_id: &DebtorId) -> LedgerResult<bool> {
        self.ensure_ready()?;
        let known = self.view.borrow().debtor(debtor_id).is_some();
        if !known && self.config.owner.is_some() {
            debug!(debtor = %debtor_id, "debtor outside the owner's view; delete skipped");
            return Ok(false);
        }

        let pending = self.begin(Phase::Mutating);
        let result = self.remove_debtor(debtor_id).await;
        self.settle(pending, result, |view, _| {
            view.debtors.retain(|d| &d.id != debtor_id);
        })?;
        if known {
            info!(debtor = %debtor_id, "debtor deleted");
        }
        Ok(known)
    }

    /// Delete one debt of `debtor_id`. Returns whether it was in the view.
    ///
    /// A debt id the view holds under a different debtor is left alone.
    pub async fn delete_debt(
        &mut self,
        debtor_id: &DebtorId,
        debt_id: &DebtId,
    ) -> LedgerResult<bool> {
        self.ensure_ready()?;
        let (known, elsewhere) = {
            let view = self.view.borrow();
            let known = view
                .debtor(debtor_id)
                .is_some_and(|d| d.debt(debt_id).is_some());
            let elsewhere = !known && view.debtors.iter().any(|d| d.debt(debt_id).is_some());
            (known, elsewhere)
        };
        if elsewhere {
            debug!(debtor = %debtor_id, debt = %debt_id, "debt belongs to another debtor; delete skipped");
            return Ok(false);
        }
        if !known && self.config.owner.is_some() {
            debug!(debt = %debt_id, "debt outside the owner's view; delete skipped");
            return Ok(false);
        }

        let pending = self.begin(Phase::Mutating);
        let result = self
            .call("delete_debt", self.backend.delete_debt(debt_id))
            .await
            .map(drop);
        self.settle(pending, result, |view, _| {
            for debtor in &mut view.debtors {
                debtor.remove_debt(debt_id);
            }
        })?;
        if known {
            info!(debtor = %debtor_id, debt = %debt_id, "debt deleted");
        }
        Ok(known)
    }

    /// Delete one payment of `debtor_id`. Returns whether it was in the
    /// view.
    ///
    /// A payment id the view holds under a different debtor is left alone.
    pub async fn delete_payment(
        &mut self,
        debtor_id: &DebtorId,
        payment_id: &PaymentId,
    ) -> LedgerResult<bool> {
        self.ensure_ready()?;
        let (known, elsewhere) = {
            let view = self.view.borrow();
            let known = view
                .debtor(debtor_id)
                .is_some_and(|d| d.payment(payment_id).is_some());
            let elsewhere =
                !known && view.debtors.iter().any(|d| d.payment(payment_id).is_some());
            (known, elsewhere)
        };
        if elsewhere {
            debug!(debtor = %debtor_id, payment = %payment_id, "payment belongs to another debtor; delete skipped");
            return Ok(false);
        }
        if !known && self.config.owner.is_some() {
            debug!(payment = %payment_id, "payment outside the owner's view; delete skipped");
            return Ok(false);
        }

        let pending = self.begin(Phase::Mutating);
        let result = self
            .call("delete_payment", self.backend.delete_payment(payment_id))
            .await
            .map(drop);
        self.settle(pending, result, |view, _| {
            for debtor in &mut view.debtors {
                debtor.remove_payment(payment_id);
            }
        })?;
        if known {
            info!(debtor = %debtor_id, payment = %payment_id, "payment deleted");
        }
        Ok(known)
    }

    // ---- collaborator access ----

    async fn call<T>(
        &self,
        op: &'static str,
        request: impl Future<Output = StorageResult<T>>,
    ) -> StorageResult<T> {
        debug!(op, "collaborator call");
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, ?timeout, "collaborator call timed out");
                Err(StorageError::Timeout(timeout))
            }
        }
    }

    async fn fetch_ledger(&self) -> StorageResult<Vec<Debtor>> {
        let owner = self.config.owner.as_ref();
        let rows = self
            .call("select_debtors", self.backend.select_debtors(owner))
            .await?;

        let mut debtors = Vec::with_capacity(rows.len());
        for row in rows {
            let mut debtor = self.debtor_from_row(row)?;
            let id = debtor.id.clone();

            let debts = self
                .call("select_debts", self.backend.select_debts(&id))
                .await?;
            debtor.debts = debts
                .into_iter()
                .map(|row| debt_from_row(&id, row))
                .collect::<StorageResult<_>>()?;
            debtor.debts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let payments = self
                .call("select_payments", self.backend.select_payments(&id))
                .await?;
            debtor.payments = payments
                .into_iter()
                .map(|row| payment_from_row(&id, row))
                .collect::<StorageResult<_>>()?;
            debtor.payments.sort_by(|a, b| b.date.cmp(&a.date));

            debtors.push(debtor);
        }
        debtors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(debtors)
    }

    async fn persist_debtor(&self, insert: &NewDebtor) -> StorageResult<Debtor> {
        let row = self
            .call("insert_debtor", self.backend.insert_debtor(insert))
            .await?;
        self.debtor_from_row(row)
    }

    async fn persist_debt(&self, insert: &NewDebt) -> StorageResult<Debt> {
        let row = self
            .call("insert_debt", self.backend.insert_debt(insert))
            .await?;
        debt_from_row(&insert.debtor_id, row)
    }

    async fn persist_payment(&self, insert: &NewPayment) -> StorageResult<Payment> {
        let row = self
            .call("insert_payment", self.backend.insert_payment(insert))
            .await?;
        payment_from_row(&insert.debtor_id, row)
    }

    async fn remove_debtor(&self, debtor_id: &DebtorId) -> StorageResult<()> {
        if !self.backend.cascades_deletes() {
            let debts = self
                .call("select_debts", self.backend.select_debts(debtor_id))
                .await?;
            for debt in debts {
                self.call("delete_debt", self.backend.delete_debt(&debt.id))
                    .await?;
            }
            let payments = self
                .call("select_payments", self.backend.select_payments(debtor_id))
                .await?;
            for payment in payments {
                self.call("delete_payment", self.backend.delete_payment(&payment.id))
                    .await?;
            }
        }
        let existed = self
            .call("delete_debtor", self.backend.delete_debtor(debtor_id))
            .await?;
        if !existed {
            debug!(debtor = %debtor_id, "debtor already absent at collaborator");
        }
        Ok(())
    }

    fn debtor_from_row(&self, row: DebtorRow) -> StorageResult<Debtor> {
        if let Some(owner) = &self.config.owner {
            if row.owner_ref.as_ref() != Some(owner) {
                return Err(StorageError::malformed(
                    "debtors",
                    format!("debtor {} belongs to another owner", row.id),
                ));
            }
        }
        Debtor::try_from(row).map_err(|e| StorageError::malformed("debtors", e))
    }

    // ---- view bookkeeping ----

    fn ensure_ready(&self) -> LedgerResult<()> {
        match self.phase() {
            Phase::Ready => Ok(()),
            phase => Err(LedgerError::NotReady(phase)),
        }
    }

    fn ensure_debtor(&self, debtor_id: &DebtorId) -> LedgerResult<()> {
        if self.view.borrow().debtor(debtor_id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::DebtorNotFound(debtor_id.clone()))
        }
    }

    /// Enter `phase` for one collaborator round trip.
    fn begin(&self, phase: Phase) -> Pending<'_> {
        let restore = self.phase();
        self.view.send_modify(|view| view.phase = phase);
        Pending {
            view: &self.view,
            restore: Some(restore),
        }
    }

    fn surface(&self, phase: Phase, error: &StorageError) {
        let message = error.to_string();
        self.view.send_modify(|view| {
            view.phase = phase;
            view.error = Some(message);
        });
    }

    /// End a mutation: apply the result to the view on success, publish the
    /// error on failure. Either way the store is ready again.
    fn settle<T>(
        &self,
        pending: Pending<'_>,
        result: StorageResult<T>,
        apply: impl FnOnce(&mut LedgerView, &T),
    ) -> LedgerResult<T> {
        pending.disarm();
        match result {
            Ok(value) => {
                self.view.send_modify(|view| {
                    apply(view, &value);
                    view.phase = Phase::Ready;
                    view.error = None;
                });
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "ledger mutation failed");
                self.surface(Phase::Ready, &e);
                Err(e.into())
            }
        }
    }
}

/// A phase held while the collaborator is busy. Dropping it before
/// [`Pending::disarm`] (the operation's future was dropped mid-flight) puts
/// the view back into the phase it left.
struct Pending<'a> {
    view: &'a watch::Sender<LedgerView>,
    restore: Option<Phase>,
}

impl Pending<'_> {
    fn disarm(mut self) {
        self.restore = None;
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if let Some(phase) = self.restore.take() {
            debug!(%phase, "pending ledger operation dropped");
            self.view.send_modify(|view| view.phase = phase);
        }
    }
}

fn debt_from_row(debtor_id: &DebtorId, row: DebtRow) -> StorageResult<Debt> {
    if &row.debtor_id != debtor_id {
        return Err(StorageError::malformed(
            "debts",
            format!("debt {} belongs to debtor {}, expected {debtor_id}", row.id, row.debtor_id),
        ));
    }
    Debt::try_from(row).map_err(|e| StorageError::malformed("debts", e))
}

fn payment_from_row(debtor_id: &DebtorId, row: PaymentRow) -> StorageResult<Payment> {
    if &row.debtor_id != debtor_id {
        return Err(StorageError::malformed(
            "payments",
            format!(
                "payment {} belongs to debtor {}, expected {debtor_id}",
                row.id, row.debtor_id
            ),
        ));
    }
    Payment::try_from(row).map_err(|e| StorageError::malformed("payments", e))
}
