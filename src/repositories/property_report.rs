//! # Property Report Repository
//!
//! Lost-and-found reports and the approval workflow. A property's `status`
//! is a cache of its most recently approved report:
//!
//! - approving a report copies the report's status onto the property;
//! - un-approving or deleting a report recomputes the status from the
//!   remaining approved reports, newest `approved_at` first, falling back to
//!   `found` when none is left.
//!
//! The report write and the cache refresh always share one transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::property::{Model as PropertyModel, PropertyStatus};
use crate::models::property_report::{
    self, ActiveModel as ReportActiveModel, Model as ReportModel,
};
use crate::models::{Property, PropertyReport};

#[derive(Debug, Clone)]
pub struct NewPropertyReport {
    pub property_id: Uuid,
    pub reporter_id: Uuid,
    pub status: PropertyStatus,
    pub content: String,
}

/// Optional filters for listing reports
#[derive(Debug, Clone, Default)]
pub struct PropertyReportFilter {
    pub property_id: Option<Uuid>,
    pub approved: Option<bool>,
}

pub struct PropertyReportRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PropertyReportRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// File a new, unapproved report against a property
    pub async fn create(&self, request: NewPropertyReport) -> Result<ReportModel, RepositoryError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(RepositoryError::validation("report content cannot be empty"));
        }

        find_property(self.db, request.property_id).await?;

        let report = ReportActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(request.property_id),
            reporter_id: Set(request.reporter_id),
            status: Set(request.status),
            content: Set(content.to_string()),
            approved: Set(false),
            approved_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        Ok(report.insert(self.db).await?)
    }

    pub async fn get(&self, report_id: Uuid) -> Result<ReportModel, RepositoryError> {
        find_report(self.db, report_id).await
    }

    /// Property the report was filed against
    pub async fn property_of(
        &self,
        report: &ReportModel,
    ) -> Result<PropertyModel, RepositoryError> {
        find_property(self.db, report.property_id).await
    }

    pub async fn list(
        &self,
        filter: PropertyReportFilter,
    ) -> Result<Vec<ReportModel>, RepositoryError> {
        let mut query = PropertyReport::find();
        if let Some(property_id) = filter.property_id {
            query = query.filter(property_report::Column::PropertyId.eq(property_id));
        }
        if let Some(approved) = filter.approved {
            query = query.filter(property_report::Column::Approved.eq(approved));
        }

        Ok(query
            .order_by_desc(property_report::Column::CreatedAt)
            .order_by_desc(property_report::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Approve or un-approve a report and refresh the property's status.
    ///
    /// Returns the updated report and the property as it stands afterwards.
    pub async fn set_approval(
        &self,
        report_id: Uuid,
        approved: bool,
    ) -> Result<(ReportModel, PropertyModel), RepositoryError> {
        let txn = self.db.begin().await?;

        let report = find_report(&txn, report_id).await?;
        let property_id = report.property_id;
        let mut active = report.into_active_model();
        active.approved = Set(approved);
        active.approved_at = Set(approved.then(|| Utc::now().into()));
        let report = active.update(&txn).await?;

        let status = if approved {
            report.status
        } else {
            latest_approved_status(&txn, property_id).await?
        };
        let property = write_property_status(&txn, property_id, status).await?;

        txn.commit().await?;

        tracing::info!(
            report_id = %report.id,
            property_id = %property.id,
            approved,
            status = ?property.status,
            "Property report approval changed"
        );
        Ok((report, property))
    }

    /// Delete a report and refresh the property's status
    pub async fn delete(&self, report_id: Uuid) -> Result<PropertyModel, RepositoryError> {
        let txn = self.db.begin().await?;

        let report = find_report(&txn, report_id).await?;
        PropertyReport::delete_by_id(report.id).exec(&txn).await?;

        let status = latest_approved_status(&txn, report.property_id).await?;
        let property = write_property_status(&txn, report.property_id, status).await?;

        txn.commit().await?;

        tracing::info!(
            report_id = %report_id,
            property_id = %property.id,
            status = ?property.status,
            "Property report deleted"
        );
        Ok(property)
    }
}

async fn find_report<C: ConnectionTrait>(
    conn: &C,
    report_id: Uuid,
) -> Result<ReportModel, RepositoryError> {
    PropertyReport::find_by_id(report_id)
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("REPORT_NOT_FOUND", "property report not found"))
}

async fn find_property<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
) -> Result<PropertyModel, RepositoryError> {
    Property::find_by_id(property_id)
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::not_found("PROPERTY_NOT_FOUND", "property not found"))
}

/// Status of the most recently approved report, `found` when there is none
async fn latest_approved_status<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
) -> Result<PropertyStatus, RepositoryError> {
    let latest = PropertyReport::find()
        .filter(property_report::Column::PropertyId.eq(property_id))
        .filter(property_report::Column::Approved.eq(true))
        .order_by_desc(property_report::Column::ApprovedAt)
        .order_by_desc(property_report::Column::CreatedAt)
        .one(conn)
        .await?;

    Ok(latest.map(|report| report.status).unwrap_or_default())
}

async fn write_property_status<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
    status: PropertyStatus,
) -> Result<PropertyModel, RepositoryError> {
    let mut active = find_property(conn, property_id).await?.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}
