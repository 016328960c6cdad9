//! Integration tests for fee services and monthly billings.

use anyhow::Result;
use apartments::error::RepositoryError;
use apartments::models::BillingItem;
use apartments::repositories::billing::MAX_LINE_QUANTITY;
use apartments::repositories::fee_service::MAX_UNIT_PRICE;
use apartments::repositories::{
    BillingRepository, FeeServiceRepository, NewBilling, NewBillingItem, NewFeeService,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_resident, setup_test_db};

async fn seed_service(
    db: &DatabaseConnection,
    name: &str,
    unit_price: i64,
    tax_percentage: f64,
) -> Result<Uuid> {
    let service = FeeServiceRepository::new(db)
        .create(NewFeeService {
            name: name.to_string(),
            unit_price,
            unit: "month".to_string(),
            tax_percentage,
        })
        .await?;
    Ok(service.id)
}

#[tokio::test]
async fn billing_totals_are_computed_from_services() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let maintenance = seed_service(&db, "Maintenance", 150_000, 10.0).await?;
    let water = seed_service(&db, "Water", 12_500, 0.0).await?;

    let billing = BillingRepository::new(&db)
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 3,
            items: vec![
                NewBillingItem {
                    service_id: maintenance,
                    quantity: 1.0,
                },
                NewBillingItem {
                    service_id: water,
                    quantity: 2.5,
                },
            ],
        })
        .await?;

    // 150000 * 1.1 + 12500 * 2.5
    assert_eq!(billing.billing.total_amount, 165_000 + 31_250);
    assert_eq!(billing.items.len(), 2);
    assert!(!billing.billing.paid);

    let reloaded = BillingRepository::new(&db)
        .get_with_items(billing.billing.id)
        .await?;
    assert_eq!(reloaded.items.len(), 2);
    assert_eq!(
        reloaded.items.iter().map(|item| item.amount).sum::<i64>(),
        reloaded.billing.total_amount
    );
    Ok(())
}

#[tokio::test]
async fn unknown_service_rolls_back_the_billing() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let water = seed_service(&db, "Water", 12_500, 0.0).await?;

    let err = BillingRepository::new(&db)
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 3,
            items: vec![
                NewBillingItem {
                    service_id: water,
                    quantity: 1.0,
                },
                NewBillingItem {
                    service_id: Uuid::new_v4(),
                    quantity: 1.0,
                },
            ],
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::NotFound { code: "SERVICE_NOT_FOUND", .. }
    ));
    assert!(BillingRepository::new(&db).list(Some(rina.id)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_period_and_quantity_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let water = seed_service(&db, "Water", 12_500, 0.0).await?;
    let billings = BillingRepository::new(&db);

    let bad_month = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 13,
            items: vec![NewBillingItem {
                service_id: water,
                quantity: 1.0,
            }],
        })
        .await;
    assert!(matches!(bad_month, Err(RepositoryError::Validation(_))));

    let negative = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 1,
            items: vec![NewBillingItem {
                service_id: water,
                quantity: -1.0,
            }],
        })
        .await;
    assert!(matches!(negative, Err(RepositoryError::Validation(_))));

    let empty = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 1,
            items: Vec::new(),
        })
        .await;
    assert!(matches!(empty, Err(RepositoryError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn oversized_amounts_are_rejected_before_saving() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let water = seed_service(&db, "Water", 1_000, 0.0).await?;
    let billings = BillingRepository::new(&db);

    let huge_quantity = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 6,
            items: vec![
                NewBillingItem {
                    service_id: water,
                    quantity: 1e300,
                },
                NewBillingItem {
                    service_id: water,
                    quantity: 1e300,
                },
            ],
        })
        .await;
    assert!(matches!(huge_quantity, Err(RepositoryError::Validation(_))));

    // Each line fits, their sum does not
    let penthouse = seed_service(&db, "Penthouse", MAX_UNIT_PRICE, 100.0).await?;
    let line = NewBillingItem {
        service_id: penthouse,
        quantity: MAX_LINE_QUANTITY,
    };
    let huge_total = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 6,
            items: vec![line; 5],
        })
        .await;
    assert!(matches!(huge_total, Err(RepositoryError::Validation(_))));

    assert!(billings.list(Some(rina.id)).await?.is_empty());
    assert_eq!(BillingItem::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn paid_billing_cannot_be_deleted() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let water = seed_service(&db, "Water", 10_000, 0.0).await?;
    let billings = BillingRepository::new(&db);

    let billing = billings
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 4,
            items: vec![NewBillingItem {
                service_id: water,
                quantity: 1.0,
            }],
        })
        .await?
        .billing;

    let paid = billings.set_paid(billing.id, true).await?;
    assert!(paid.paid);
    assert!(paid.paid_at.is_some());

    let err = billings.delete(billing.id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Conflict { code: "BILLING_ALREADY_PAID", .. }
    ));

    let unpaid = billings.set_paid(billing.id, false).await?;
    assert!(unpaid.paid_at.is_none());
    billings.delete(billing.id).await?;
    assert_eq!(BillingItem::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn service_in_use_cannot_be_deleted() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let water = seed_service(&db, "Water", 10_000, 0.0).await?;

    BillingRepository::new(&db)
        .create(NewBilling {
            user_id: rina.id,
            period_year: 2026,
            period_month: 5,
            items: vec![NewBillingItem {
                service_id: water,
                quantity: 3.0,
            }],
        })
        .await?;

    let err = FeeServiceRepository::new(&db).delete(water).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Conflict { code: "SERVICE_IN_USE", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn service_validation_and_unique_names() -> Result<()> {
    let db = setup_test_db().await?;
    let services = FeeServiceRepository::new(&db);
    seed_service(&db, "Parking", 50_000, 11.0).await?;

    let duplicate = services
        .create(NewFeeService {
            name: "Parking".to_string(),
            unit_price: 1,
            unit: "month".to_string(),
            tax_percentage: 0.0,
        })
        .await;
    assert!(matches!(
        duplicate,
        Err(RepositoryError::Conflict { code: "SERVICE_NAME_TAKEN", .. })
    ));

    let bad_tax = services
        .create(NewFeeService {
            name: "Laundry".to_string(),
            unit_price: 1,
            unit: "kg".to_string(),
            tax_percentage: 120.0,
        })
        .await;
    assert!(matches!(bad_tax, Err(RepositoryError::Validation(_))));

    let negative_price = services
        .create(NewFeeService {
            name: "Gym".to_string(),
            unit_price: -5,
            unit: "visit".to_string(),
            tax_percentage: 0.0,
        })
        .await;
    assert!(matches!(negative_price, Err(RepositoryError::Validation(_))));

    let too_expensive = services
        .create(NewFeeService {
            name: "Helipad".to_string(),
            unit_price: MAX_UNIT_PRICE + 1,
            unit: "landing".to_string(),
            tax_percentage: 0.0,
        })
        .await;
    assert!(matches!(too_expensive, Err(RepositoryError::Validation(_))));
    Ok(())
}
