//! # Billing Repository
//!
//! A billing is issued to one user for one month and carries one line per
//! service. Line amounts are computed here, never accepted from clients:
//!
//! `amount = round(unit_price * quantity * (1 + tax_percentage / 100))`
//!
//! and the billing total is the sum of its lines.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::billing::{self, ActiveModel as BillingActiveModel, Model as BillingModel};
use crate::models::billing_item::{
    self, ActiveModel as BillingItemActiveModel, Model as BillingItemModel,
};
use crate::models::{Billing, BillingItem, FeeService, User, fee_service};
use crate::validation::{is_non_negative, is_valid_year};

#[derive(Debug, Clone)]
pub struct NewBillingItem {
    pub service_id: Uuid,
    pub quantity: f64,
}

#[derive(Debug, Clone)]
pub struct NewBilling {
    pub user_id: Uuid,
    pub period_year: i32,
    pub period_month: i32,
    pub items: Vec<NewBillingItem>,
}

/// A billing together with its line items
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BillingWithItems {
    #[serde(flatten)]
    pub billing: BillingModel,
    pub items: Vec<BillingItemModel>,
}

/// Largest quantity accepted on a single billing line
pub const MAX_LINE_QUANTITY: f64 = 1_000_000.0;

/// Amount of a single line, tax included, rounded to the nearest unit.
///
/// Returns `None` when the amount does not fit in an `i64`.
pub fn line_amount(unit_price: i64, quantity: f64, tax_percentage: f64) -> Option<i64> {
    let amount = (unit_price as f64 * quantity * (1.0 + tax_percentage / 100.0)).round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if amount.is_finite() && amount >= 0.0 && amount < i64::MAX as f64 {
        Some(amount as i64)
    } else {
        None
    }
}

/// Sum of line amounts, `None` on overflow
pub fn billing_total(amounts: impl IntoIterator<Item = i64>) -> Option<i64> {
    amounts
        .into_iter()
        .try_fold(0i64, |total, amount| total.checked_add(amount))
}

pub struct BillingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BillingRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issue a billing and its items in one transaction
    pub async fn create(&self, request: NewBilling) -> Result<BillingWithItems, RepositoryError> {
        validate_period(request.period_year, request.period_month)?;
        if request.items.is_empty() {
            return Err(RepositoryError::validation("a billing needs at least one item"));
        }
        if let Some(item) = request
            .items
            .iter()
            .find(|i| !is_non_negative(i.quantity) || i.quantity > MAX_LINE_QUANTITY)
        {
            return Err(RepositoryError::validation(format!(
                "quantity for service {} must be between 0 and {MAX_LINE_QUANTITY}",
                item.service_id
            )));
        }

        User::find_by_id(request.user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "user not found"))?;

        let service_ids: Vec<Uuid> = request.items.iter().map(|i| i.service_id).collect();
        let services: HashMap<Uuid, _> = FeeService::find()
            .filter(fee_service::Column::Id.is_in(service_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|service| (service.id, service))
            .collect();

        let billing_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let service = services.get(&item.service_id).ok_or_else(|| {
                RepositoryError::not_found(
                    "SERVICE_NOT_FOUND",
                    format!("service {} not found", item.service_id),
                )
            })?;
            let amount = line_amount(service.unit_price, item.quantity, service.tax_percentage)
                .ok_or_else(|| {
                    RepositoryError::validation(format!(
                        "amount for service {} is too large",
                        service.id
                    ))
                })?;

            items.push(BillingItemModel {
                id: Uuid::new_v4(),
                billing_id,
                service_id: service.id,
                quantity: item.quantity,
                unit_price: service.unit_price,
                tax_percentage: service.tax_percentage,
                amount,
            });
        }
        let total_amount = billing_total(items.iter().map(|item| item.amount))
            .ok_or_else(|| RepositoryError::validation("billing total is too large"))?;

        let txn = self.db.begin().await?;

        let billing = BillingActiveModel {
            id: Set(billing_id),
            user_id: Set(request.user_id),
            period_year: Set(request.period_year),
            period_month: Set(request.period_month),
            total_amount: Set(total_amount),
            paid: Set(false),
            paid_at: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            let row = BillingItemActiveModel {
                id: Set(item.id),
                billing_id: Set(item.billing_id),
                service_id: Set(item.service_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                tax_percentage: Set(item.tax_percentage),
                amount: Set(item.amount),
            };
            saved.push(row.insert(&txn).await?);
        }

        txn.commit().await?;

        tracing::info!(
            billing_id = %billing.id,
            user_id = %billing.user_id,
            items = saved.len(),
            total_amount,
            "Billing created"
        );
        Ok(BillingWithItems {
            billing,
            items: saved,
        })
    }

    pub async fn get(&self, billing_id: Uuid) -> Result<BillingModel, RepositoryError> {
        Billing::find_by_id(billing_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("BILLING_NOT_FOUND", "billing not found"))
    }

    pub async fn get_with_items(
        &self,
        billing_id: Uuid,
    ) -> Result<BillingWithItems, RepositoryError> {
        let billing = self.get(billing_id).await?;
        let items = BillingItem::find()
            .filter(billing_item::Column::BillingId.eq(billing.id))
            .order_by_asc(billing_item::Column::Id)
            .all(self.db)
            .await?;

        Ok(BillingWithItems { billing, items })
    }

    /// List billings newest period first, optionally for a single user
    pub async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<BillingModel>, RepositoryError> {
        let mut query = Billing::find();
        if let Some(user_id) = user_id {
            query = query.filter(billing::Column::UserId.eq(user_id));
        }

        Ok(query
            .order_by_desc(billing::Column::PeriodYear)
            .order_by_desc(billing::Column::PeriodMonth)
            .order_by_desc(billing::Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    pub async fn set_paid(
        &self,
        billing_id: Uuid,
        paid: bool,
    ) -> Result<BillingModel, RepositoryError> {
        let mut active = self.get(billing_id).await?.into_active_model();
        active.paid = Set(paid);
        active.paid_at = Set(paid.then(|| Utc::now().into()));

        let billing = active.update(self.db).await?;
        tracing::info!(billing_id = %billing.id, paid, "Billing payment state changed");
        Ok(billing)
    }

    /// Delete an unpaid billing; items go with it
    pub async fn delete(&self, billing_id: Uuid) -> Result<(), RepositoryError> {
        let billing = self.get(billing_id).await?;
        if billing.paid {
            return Err(RepositoryError::conflict(
                "BILLING_ALREADY_PAID",
                "paid billings cannot be deleted",
            ));
        }

        Billing::delete_by_id(billing.id).exec(self.db).await?;
        Ok(())
    }
}

fn validate_period(year: i32, month: i32) -> Result<(), RepositoryError> {
    if !is_valid_year(year) {
        return Err(RepositoryError::validation(format!("period_year {year} is out of range")));
    }
    if !(1..=12).contains(&month) {
        return Err(RepositoryError::validation(format!(
            "period_month must be between 1 and 12, got {month}"
        )));
    }
    Ok(())
}
