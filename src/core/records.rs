//! Typed records read from the record store.
//!
//! These are owned by whatever flows create customers, invoices and payments.
//! The metrics core only reads them.

use crate::core::error::{MetricsError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// Opaque tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BusinessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub business_id: BusinessId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub business_id: BusinessId,
    pub customer_id: String,
    pub invoice_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// A payment against an invoice. Its business is whatever business owns the
/// invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// An invoice joined with its customer's name.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub invoice: Invoice,
    pub customer_name: String,
}

/// A payment joined with its invoice number and the invoice customer's name.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub payment: Payment,
    pub invoice_number: String,
    pub customer_name: String,
}

/// Checks a currency code is three ASCII letters and returns it upper-cased.
pub fn normalize_currency_code(code: &str) -> Result<String> {
    let trimmed = code.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(MetricsError::UnknownCurrency(code.to_string()))
    }
}

fn check_money(amount: Decimal, currency: &str, owner: &str) -> Result<String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MetricsError::invalid(format!(
            "{owner} has negative amount {amount}"
        )));
    }
    normalize_currency_code(currency)
        .map_err(|_| MetricsError::invalid(format!("{owner} has invalid currency '{currency}'")))
}

/// Stored records never move between businesses.
fn check_owner(
    kind: &str,
    id: &str,
    business: &BusinessId,
    known: &HashMap<String, BusinessId>,
) -> Result<()> {
    match known.get(id) {
        Some(stored) if stored != business => Err(MetricsError::invalid(format!(
            "{kind} {id} already belongs to {stored}, not {business}"
        ))),
        _ => Ok(()),
    }
}

/// Import document holding records for one or more businesses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Dataset {
    /// Validates every record and upper-cases currency codes.
    ///
    /// `known_customers` and `known_invoices` hold records already persisted,
    /// so a dataset may reference them without repeating them.
    pub fn validate(
        &mut self,
        known_customers: &HashMap<String, BusinessId>,
        known_invoices: &HashMap<String, BusinessId>,
    ) -> Result<()> {
        let mut customers = known_customers.clone();
        let mut seen = HashSet::new();
        for customer in &self.customers {
            if customer.name.trim().is_empty() {
                return Err(MetricsError::invalid(format!(
                    "customer {} has no name",
                    customer.id
                )));
            }
            if !seen.insert(customer.id.as_str()) {
                return Err(MetricsError::invalid(format!(
                    "customer {} appears more than once",
                    customer.id
                )));
            }
            check_owner("customer", &customer.id, &customer.business_id, known_customers)?;
            customers.insert(customer.id.clone(), customer.business_id.clone());
        }

        let mut invoices: HashSet<String> = known_invoices.keys().cloned().collect();
        let mut seen = HashSet::new();
        for invoice in &mut self.invoices {
            let owner = format!("invoice {}", invoice.id);
            if !seen.insert(invoice.id.clone()) {
                return Err(MetricsError::invalid(format!("{owner} appears more than once")));
            }
            check_owner("invoice", &invoice.id, &invoice.business_id, known_invoices)?;
            invoice.currency = check_money(invoice.amount, &invoice.currency, &owner)?;
            match customers.get(&invoice.customer_id) {
                Some(business) if *business == invoice.business_id => {}
                Some(business) => {
                    return Err(MetricsError::invalid(format!(
                        "{owner} belongs to {} but customer {} belongs to {business}",
                        invoice.business_id, invoice.customer_id
                    )));
                }
                None => {
                    return Err(MetricsError::invalid(format!(
                        "{owner} references unknown customer {}",
                        invoice.customer_id
                    )));
                }
            }
            invoices.insert(invoice.id.clone());
        }

        let mut seen = HashSet::new();
        for payment in &mut self.payments {
            let owner = format!("payment {}", payment.id);
            if !seen.insert(payment.id.clone()) {
                return Err(MetricsError::invalid(format!("{owner} appears more than once")));
            }
            payment.currency = check_money(payment.amount, &payment.currency, &owner)?;
            if !invoices.contains(&payment.invoice_id) {
                return Err(MetricsError::invalid(format!(
                    "{owner} references unknown invoice {}",
                    payment.invoice_id
                )));
            }
        }

        Ok(())
    }
}
