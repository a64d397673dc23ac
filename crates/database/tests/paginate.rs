use std::collections::BTreeSet;

use anyhow::Result;
use serde_json::{json, Value};

use koinonia_database::mock::MemoryClient;
use koinonia_database::{
    paginate, ListFilter, Operator, OrTerm, StatusFilter, StorageError, TableClient,
};

/// Seeds a members table: even ids are "active", every third row is
/// unconfirmed, `created_at` increases with the id.
async fn seed_members(client: &MemoryClient, total: i64) -> Result<()> {
    for n in 0..total {
        client
            .insert(
                "members",
                json!({
                    "id": n,
                    "full_name": format!("Member {n:02}"),
                    "status": if n % 2 == 0 { "active" } else { "lapsed" },
                    "confirmed": n % 3 != 0,
                    "created_at": 1_700_000_000_i64 + n,
                }),
            )
            .await?;
    }
    Ok(())
}

fn ids(page: &koinonia_database::Page<Value>) -> Vec<i64> {
    page.items.iter().map(|row| row["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn page_three_of_ten_covers_rows_20_through_29() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 40).await?;

    let filter = ListFilter::new().order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 3, 10, &filter).await?;

    assert_eq!(ids(&page), (20..30).collect::<Vec<_>>());
    assert_eq!(page.current_page, 3);
    assert_eq!(page.total_items, 40);
    Ok(())
}

#[tokio::test]
async fn next_page_flag_follows_total_pages() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 25).await?;
    let filter = ListFilter::new().order_by("id", true);

    let first = paginate::<Value, _>(&client, "members", 1, 10, &filter).await?;
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 10);
    assert!(first.next_page);

    let second = paginate::<Value, _>(&client, "members", 2, 10, &filter).await?;
    assert!(second.next_page);

    let third = paginate::<Value, _>(&client, "members", 3, 10, &filter).await?;
    assert_eq!(third.items.len(), 5);
    assert!(!third.next_page);

    // Past the end: empty page, flag stays off.
    let fourth = paginate::<Value, _>(&client, "members", 4, 10, &filter).await?;
    assert!(fourth.items.is_empty());
    assert!(!fourth.next_page);
    Ok(())
}

#[tokio::test]
async fn pages_cover_every_row_exactly_once() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 23).await?;
    let filter = ListFilter::new().order_by("id", true);

    let mut seen = BTreeSet::new();
    let first = paginate::<Value, _>(&client, "members", 1, 5, &filter).await?;
    for page_number in 1..=first.total_pages {
        let page = paginate::<Value, _>(&client, "members", page_number, 5, &filter).await?;
        assert!(page.items.len() <= 5);
        for id in ids(&page) {
            assert!(seen.insert(id), "row {id} appeared on two pages");
        }
    }
    assert_eq!(seen.len(), 23);
    Ok(())
}

#[tokio::test]
async fn bounds_and_equality_compose_conjunctively() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 20).await?;

    let filter = ListFilter::new()
        .gte("created_at", json!(1_700_000_005_i64))
        .lte("created_at", json!(1_700_000_014_i64))
        .eq("status", json!("active"))
        .order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 10, &filter).await?;

    // Even ids within 5..=14.
    assert_eq!(ids(&page), vec![6, 8, 10, 12, 14]);
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 1);
    assert!(!page.next_page);
    Ok(())
}

#[tokio::test]
async fn non_array_in_filter_is_skipped_not_fatal() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 8).await?;

    // "active" is not an array, so the constraint is dropped entirely.
    let filter = ListFilter::new().in_query("status", json!("active")).order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 20, &filter).await?;

    assert_eq!(page.total_items, 8);
    assert_eq!(page.items.len(), 8);
    Ok(())
}

#[tokio::test]
async fn array_in_filter_restricts_rows() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 8).await?;

    let filter = ListFilter::new()
        .in_query("id", json!([1, 3, 5]))
        .order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 20, &filter).await?;

    assert_eq!(ids(&page), vec![1, 3, 5]);
    assert_eq!(page.total_items, 3);
    Ok(())
}

#[tokio::test]
async fn or_group_and_negation() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 10).await?;

    let filter = ListFilter::new()
        .or(vec![
            OrTerm::new("id", Operator::Lte, json!(1)),
            OrTerm::new("id", Operator::Gte, json!(8)),
        ])
        .not("status", Operator::Eq, json!("lapsed"))
        .order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 10, &filter).await?;

    // ids in {0,1,8,9} that are even (= "active").
    assert_eq!(ids(&page), vec![0, 8]);
    Ok(())
}

#[tokio::test]
async fn status_filter_all_bypasses_active_restricts() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 9).await?;

    let bypass = ListFilter::new().active("confirmed", StatusFilter::All);
    let page = paginate::<Value, _>(&client, "members", 1, 20, &bypass).await?;
    assert_eq!(page.total_items, 9);

    let only_confirmed = ListFilter::new()
        .active("confirmed", StatusFilter::Active)
        .order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 20, &only_confirmed).await?;
    // Every third row (0, 3, 6) is unconfirmed.
    assert_eq!(ids(&page), vec![1, 2, 4, 5, 7, 8]);
    Ok(())
}

#[tokio::test]
async fn projection_limits_returned_columns() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 3).await?;

    let filter = ListFilter::new().select(&["id", "full_name"]).order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 10, &filter).await?;

    for row in &page.items {
        let object = row.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("id"));
        assert!(object.contains_key("full_name"));
    }
    Ok(())
}

#[tokio::test]
async fn ilike_matches_substring_case_insensitively() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 12).await?;

    let filter = ListFilter::new().ilike("full_name", "MEMBER 1").order_by("id", true);
    let page = paginate::<Value, _>(&client, "members", 1, 20, &filter).await?;

    // "Member 10" and "Member 11".
    assert_eq!(ids(&page), vec![10, 11]);
    Ok(())
}

#[tokio::test]
async fn zero_matches_gives_empty_page_without_next() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 5).await?;

    let filter = ListFilter::new().eq("status", json!("nonexistent"));
    let page = paginate::<Value, _>(&client, "members", 1, 10, &filter).await?;

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.next_page);
    Ok(())
}

#[tokio::test]
async fn page_size_below_one_is_rejected() -> Result<()> {
    let client = MemoryClient::new();
    let err = paginate::<Value, _>(&client, "members", 1, 0, &ListFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::QueryConstruction(_)));
    Ok(())
}

#[tokio::test]
async fn page_below_one_is_clamped_to_first() -> Result<()> {
    let client = MemoryClient::new();
    seed_members(&client, 6).await?;
    let filter = ListFilter::new().order_by("id", true);

    let clamped = paginate::<Value, _>(&client, "members", 0, 3, &filter).await?;
    let first = paginate::<Value, _>(&client, "members", 1, 3, &filter).await?;
    assert_eq!(ids(&clamped), ids(&first));
    assert_eq!(clamped.current_page, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_resource_name_is_rejected() -> Result<()> {
    let client = MemoryClient::new();
    let err = paginate::<Value, _>(&client, "members; drop", 1, 10, &ListFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::QueryConstruction(_)));
    Ok(())
}

#[tokio::test]
async fn fetch_one_demands_exactly_one_row() -> Result<()> {
    use koinonia_database::TableQuery;

    let client = MemoryClient::new();
    seed_members(&client, 4).await?;

    let row = client
        .fetch_one("members", &TableQuery::new().eq("id", json!(2)))
        .await?;
    assert_eq!(row["full_name"], json!("Member 02"));

    let missing = client
        .fetch_one("members", &TableQuery::new().eq("id", json!(99)))
        .await
        .unwrap_err();
    assert!(missing.is_not_found());

    let too_many = client
        .fetch_one("members", &TableQuery::new().eq("status", json!("active")))
        .await
        .unwrap_err();
    assert!(matches!(too_many, StorageError::Remote { .. }));
    Ok(())
}

#[tokio::test]
#[ignore = "needs a live Postgres reachable via DATABASE_URL"]
async fn postgres_round_trip() -> Result<()> {
    use koinonia_common::EnvVars;
    use koinonia_database::{PostgresClient, PostgresEnv};

    dotenv::dotenv().ok();
    let client = PostgresClient::connect(&PostgresEnv::load()).await?;
    client
        .execute_ddl(
            "CREATE TABLE IF NOT EXISTS \"paginate_scratch\" (\
             \"id\" UUID PRIMARY KEY, \
             \"label\" TEXT NOT NULL, \
             \"created_at\" BIGINT NOT NULL)",
        )
        .await?;

    for n in 0..3_i64 {
        client
            .insert(
                "paginate_scratch",
                json!({
                    "id": uuid::Uuid::new_v4(),
                    "label": format!("row {n}"),
                    "created_at": n,
                }),
            )
            .await?;
    }

    let filter = ListFilter::new().order_by("created_at", true);
    let page = paginate::<Value, _>(&client, "paginate_scratch", 1, 2, &filter).await?;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_items, 3);
    assert!(page.next_page);

    client.execute_ddl("DROP TABLE \"paginate_scratch\"").await?;
    Ok(())
}
