use debtbook_types::{Debtor, DebtorId};
use serde::Serialize;

/// Ledger-wide aggregate over a collection of debtors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_debtors: usize,
    pub total_debt: f64,
    pub total_paid: f64,
    pub total_remaining: f64,
    pub overall_percentage: f64,
}

/// Per-debtor figures computed together.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DebtorSummary {
    pub debtor_id: DebtorId,
    pub name: String,
    pub debt_count: usize,
    pub payment_count: usize,
    pub total_debt: f64,
    pub total_paid: f64,
    pub remaining: f64,
    pub payment_percentage: f64,
}

/// Sum of the debtor's debt amounts.
pub fn total_debt(debtor: &Debtor) -> f64 {
    debtor.debts.iter().map(|d| d.amount).sum()
}

/// Sum of the debtor's payment amounts.
pub fn total_paid(debtor: &Debtor) -> f64 {
    debtor.payments.iter().map(|p| p.amount).sum()
}

/// Outstanding balance. Negative when the debtor has overpaid.
pub fn remaining(debtor: &Debtor) -> f64 {
    total_debt(debtor) - total_paid(debtor)
}

/// Share of the debt that has been paid, in percent. Zero when there is no
/// debt; may exceed 100.
pub fn payment_percentage(debtor: &Debtor) -> f64 {
    percentage(total_paid(debtor), total_debt(debtor))
}

pub fn summarize(debtor: &Debtor) -> DebtorSummary {
    let debt = total_debt(debtor);
    let paid = total_paid(debtor);
    DebtorSummary {
        debtor_id: debtor.id.clone(),
        name: debtor.name.clone(),
        debt_count: debtor.debts.len(),
        payment_count: debtor.payments.len(),
        total_debt: debt,
        total_paid: paid,
        remaining: debt - paid,
        payment_percentage: percentage(paid, debt),
    }
}

pub fn global_stats(debtors: &[Debtor]) -> GlobalStats {
    let total_debt: f64 = debtors.iter().map(total_debt).sum();
    let total_paid: f64 = debtors.iter().map(total_paid).sum();
    GlobalStats {
        total_debtors: debtors.len(),
        total_debt,
        total_paid,
        total_remaining: total_debt - total_paid,
        overall_percentage: percentage(total_paid, total_debt),
    }
}

fn percentage(paid: f64, debt: f64) -> f64 {
    if debt == 0.0 {
        0.0
    } else {
        paid / debt * 100.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use debtbook_types::{Debt, DebtId, Payment, PaymentId};
    use proptest::prelude::*;

    use super::*;

    fn debtor(debts: &[f64], payments: &[f64]) -> Debtor {
        let now = Utc::now();
        let mut d = Debtor::new(DebtorId::generate(), "Alice", now, None);
        for amount in debts {
            d.debts.push(Debt {
                id: DebtId::generate(),
                description: "loan".into(),
                amount: *amount,
                created_at: now,
            });
        }
        for amount in payments {
            d.payments.push(Payment {
                id: PaymentId::generate(),
                amount: *amount,
                date: now,
                notes: None,
                created_at: now,
            });
        }
        d
    }

    #[test]
    fn empty_debtor_is_all_zero() {
        let d = debtor(&[], &[]);
        assert_eq!(total_debt(&d), 0.0);
        assert_eq!(total_paid(&d), 0.0);
        assert_eq!(remaining(&d), 0.0);
        assert_eq!(payment_percentage(&d), 0.0);
    }

    #[test]
    fn partial_payment() {
        let d = debtor(&[100.0], &[40.0]);
        assert_eq!(total_debt(&d), 100.0);
        assert_eq!(total_paid(&d), 40.0);
        assert_eq!(remaining(&d), 60.0);
        assert_eq!(payment_percentage(&d), 40.0);
    }

    #[test]
    fn overpayment_is_not_clamped() {
        let d = debtor(&[100.0], &[150.0]);
        assert_eq!(remaining(&d), -50.0);
        assert_eq!(payment_percentage(&d), 150.0);
    }

    #[test]
    fn payments_without_debt_have_zero_percentage() {
        let d = debtor(&[], &[25.0]);
        assert_eq!(remaining(&d), -25.0);
        assert_eq!(payment_percentage(&d), 0.0);
    }

    #[test]
    fn global_stats_of_nothing() {
        assert_eq!(
            global_stats(&[]),
            GlobalStats {
                total_debtors: 0,
                total_debt: 0.0,
                total_paid: 0.0,
                total_remaining: 0.0,
                overall_percentage: 0.0,
            }
        );
    }

    #[test]
    fn global_stats_aggregates_debtors() {
        let debtors = vec![debtor(&[100.0, 50.0], &[30.0]), debtor(&[50.0], &[70.0])];
        let stats = global_stats(&debtors);
        assert_eq!(stats.total_debtors, 2);
        assert_eq!(stats.total_debt, 200.0);
        assert_eq!(stats.total_paid, 100.0);
        assert_eq!(stats.total_remaining, 100.0);
        assert_eq!(stats.overall_percentage, 50.0);
    }

    #[test]
    fn summary_matches_individual_functions() {
        let d = debtor(&[100.0], &[100.0, 20.0]);
        let s = summarize(&d);
        assert_eq!(s.debt_count, 1);
        assert_eq!(s.payment_count, 2);
        assert_eq!(s.remaining, -20.0);
        assert_eq!(s.payment_percentage, 120.0);
        assert_eq!(s.total_debt, total_debt(&d));
        assert_eq!(s.total_paid, total_paid(&d));
    }

    proptest! {
        #[test]
        fn remaining_is_debt_minus_paid(
            debts in prop::collection::vec(0.0f64..1e9, 0..8),
            payments in prop::collection::vec(0.0f64..1e9, 0..8),
        ) {
            let d = debtor(&debts, &payments);
            prop_assert_eq!(remaining(&d), total_debt(&d) - total_paid(&d));
        }

        #[test]
        fn no_debt_means_zero_percentage(
            payments in prop::collection::vec(0.0f64..1e9, 0..8),
        ) {
            let d = debtor(&[], &payments);
            prop_assert_eq!(payment_percentage(&d), 0.0);
        }

        #[test]
        fn global_totals_sum_per_debtor_totals(
            ledger in prop::collection::vec(
                (prop::collection::vec(0.0f64..1e6, 0..4), prop::collection::vec(0.0f64..1e6, 0..4)),
                0..6,
            ),
        ) {
            let debtors: Vec<Debtor> = ledger.iter().map(|(d, p)| debtor(d, p)).collect();
            let stats = global_stats(&debtors);
            let debt: f64 = debtors.iter().map(total_debt).sum();
            let paid: f64 = debtors.iter().map(total_paid).sum();
            prop_assert_eq!(stats.total_debtors, debtors.len());
            prop_assert_eq!(stats.total_debt, debt);
            prop_assert_eq!(stats.total_paid, paid);
            prop_assert_eq!(stats.total_remaining, debt - paid);
        }
    }
}
