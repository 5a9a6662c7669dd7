//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use overseer_core::{
  ErrorKind, ValidationError,
  clock::FixedClock,
  item::NewItem,
  ledger::Ledger,
  observation::{Label, Labels, NewObservation, ObservationPatch},
  store::PriceStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 5, 10)
    .unwrap()
    .and_hms_opt(12, 0, 0)
    .unwrap()
}

fn labels(ls: &[Label]) -> Labels { ls.iter().copied().collect() }

fn all_labels() -> Labels { labels(&[Label::Day, Label::Month, Label::Year]) }

async fn item(s: &SqliteStore, name: &str) -> Uuid {
  s.add_item(NewItem { name: name.into() }, t0())
    .await
    .unwrap()
    .item_id
}

fn sample(item_id: Uuid, price: &str, count: i64) -> NewObservation {
  NewObservation { item_id, price: price.into(), count }
}

// ─── Items ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_item() {
  let s = store().await;

  let added = s
    .add_item(NewItem { name: "AKR | Carbon".into() }, t0())
    .await
    .unwrap();
  let fetched = s.get_item(added.item_id).await.unwrap().unwrap();
  assert_eq!(fetched, added);
}

#[tokio::test]
async fn get_item_missing_returns_none() {
  let s = store().await;
  assert!(s.get_item(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_items_filtered_by_name() {
  let s = store().await;
  item(&s, "AKR | Carbon").await;
  item(&s, "M4 | Carbon").await;
  item(&s, "Knife | Dragon").await;

  assert_eq!(s.list_items(None).await.unwrap().len(), 3);

  let carbon = s.list_items(Some("Carbon".into())).await.unwrap();
  assert_eq!(carbon.len(), 2);
  assert_eq!(carbon[0].name, "AKR | Carbon");
  assert_eq!(carbon[1].name, "M4 | Carbon");
}

#[tokio::test]
async fn list_items_matches_wildcards_literally() {
  let s = store().await;
  item(&s, "100% Carbon").await;
  item(&s, "1000 Carbon").await;
  item(&s, "AK_47").await;
  item(&s, "AKR47").await;
  item(&s, "C:\\skins").await;

  let percent = s.list_items(Some("0%".into())).await.unwrap();
  assert_eq!(percent.len(), 1);
  assert_eq!(percent[0].name, "100% Carbon");

  let underscore = s.list_items(Some("K_".into())).await.unwrap();
  assert_eq!(underscore.len(), 1);
  assert_eq!(underscore[0].name, "AK_47");

  let backslash = s.list_items(Some("\\".into())).await.unwrap();
  assert_eq!(backslash.len(), 1);
}

#[tokio::test]
async fn remove_item_drops_observations_and_overlay() {
  let s = store().await;
  let id = item(&s, "AKR | Carbon").await;
  let obs = s.record_observation(sample(id, "1.00", 1), t0()).await.unwrap();

  s.remove_item(id).await.unwrap();

  assert!(s.get_item(id).await.unwrap().is_none());
  assert!(s.get_realtime(id).await.unwrap().is_none());
  assert!(s.get_observation(obs.observation_id).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_missing_item_errors() {
  let s = store().await;
  let err = s.remove_item(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::ItemNotFound(_)));
}

// ─── Labelling ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_observation_gets_every_label() {
  let s = store().await;
  let id = item(&s, "a").await;

  let obs = s.record_observation(sample(id, "10.00", 5), t0()).await.unwrap();
  assert_eq!(obs.labels, all_labels());
  assert_eq!(obs.registered_at, t0());
}

#[tokio::test]
async fn ten_minutes_later_gets_no_labels() {
  let s = store().await;
  let id = item(&s, "a").await;

  s.record_observation(sample(id, "10.00", 5), t0()).await.unwrap();
  let second = s
    .record_observation(sample(id, "10.50", 3), t0() + Duration::minutes(10))
    .await
    .unwrap();
  assert!(second.labels.is_empty());

  let overlay = s.get_realtime(id).await.unwrap().unwrap();
  assert_eq!(overlay.previous_price.as_deref(), Some("10.00"));
  assert_eq!(overlay.previous_count, Some(5));
  assert_eq!(overlay.last_price, "10.50");
  assert_eq!(overlay.last_count, 3);
}

#[tokio::test]
async fn half_an_hour_later_gets_day_only() {
  let s = store().await;
  let id = item(&s, "a").await;

  s.record_observation(sample(id, "1", 1), t0()).await.unwrap();
  let next = s
    .record_observation(sample(id, "1", 1), t0() + Duration::minutes(30))
    .await
    .unwrap();
  assert_eq!(next.labels, labels(&[Label::Day]));
}

#[tokio::test]
async fn three_hours_later_gets_day_and_month() {
  let s = store().await;
  let id = item(&s, "a").await;

  s.record_observation(sample(id, "1", 1), t0()).await.unwrap();
  let next = s
    .record_observation(sample(id, "1", 1), t0() + Duration::hours(3))
    .await
    .unwrap();
  assert_eq!(next.labels, labels(&[Label::Day, Label::Month]));
}

#[tokio::test]
async fn next_day_gets_every_label() {
  let s = store().await;
  let id = item(&s, "a").await;

  s.record_observation(sample(id, "1", 1), t0()).await.unwrap();
  let next = s
    .record_observation(sample(id, "1", 1), t0() + Duration::hours(25))
    .await
    .unwrap();
  assert_eq!(next.labels, all_labels());
}

#[tokio::test]
async fn unlabelled_rows_do_not_suppress_labels() {
  let s = store().await;
  let id = item(&s, "a").await;

  // t0: all, +5m: none, +20m: day (the +5m row carries no day label).
  s.record_observation(sample(id, "1", 1), t0()).await.unwrap();
  s.record_observation(sample(id, "1", 1), t0() + Duration::minutes(5))
    .await
    .unwrap();
  let third = s
    .record_observation(sample(id, "1", 1), t0() + Duration::minutes(20))
    .await
    .unwrap();
  assert_eq!(third.labels, labels(&[Label::Day]));
}

#[tokio::test]
async fn labelling_is_per_item() {
  let s = store().await;
  let a = item(&s, "a").await;
  let b = item(&s, "b").await;

  s.record_observation(sample(a, "1", 1), t0()).await.unwrap();
  let other = s
    .record_observation(sample(b, "1", 1), t0() + Duration::minutes(1))
    .await
    .unwrap();
  assert_eq!(other.labels, all_labels());
}

#[tokio::test]
async fn failed_append_leaves_nothing_behind() {
  let s = store().await;
  let unknown = Uuid::new_v4();

  // Violates the items foreign key.
  assert!(s.record_observation(sample(unknown, "1", 1), t0()).await.is_err());

  assert!(s.get_realtime(unknown).await.unwrap().is_none());
  let rows = s
    .find_window(unknown, t0() - Duration::days(1), t0())
    .await
    .unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn overlay_failure_rolls_back_the_row() {
  let s = store().await;
  let id = item(&s, "a").await;
  let kept = s.record_observation(sample(id, "1.00", 1), t0()).await.unwrap();

  s.execute_batch(
    "CREATE TRIGGER reject_overlay_insert BEFORE INSERT ON realtime_overlays
     BEGIN SELECT RAISE(ABORT, 'overlay rejected'); END;
     CREATE TRIGGER reject_overlay_update BEFORE UPDATE ON realtime_overlays
     BEGIN SELECT RAISE(ABORT, 'overlay rejected'); END;",
  )
  .await
  .unwrap();

  let later = t0() + Duration::hours(3);
  assert!(s.record_observation(sample(id, "2.00", 2), later).await.is_err());

  let rows = s.find_window(id, t0(), later).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0], kept);

  let overlay = s.get_realtime(id).await.unwrap().unwrap();
  assert_eq!(overlay.last_price, "1.00");
  assert_eq!(overlay.previous_price, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_are_serialised() {
  const WRITERS: i64 = 20;

  let s = store().await;
  let id = item(&s, "a").await;

  let handles: Vec<_> = (0..WRITERS)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.record_observation(sample(id, "5.00", i), t0()).await
      })
    })
    .collect();
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  let rows = s.find_window(id, t0(), t0()).await.unwrap();
  assert_eq!(rows.len(), WRITERS as usize);
  let labelled: Vec<_> = rows.iter().filter(|o| !o.labels.is_empty()).collect();
  assert_eq!(labelled.len(), 1);
  assert_eq!(labelled[0].labels, all_labels());

  // Every append shifted the overlay exactly once.
  let overlay = s.get_realtime(id).await.unwrap().unwrap();
  let (Some(previous), last) = (overlay.previous_count, overlay.last_count) else {
    panic!("overlay never shifted: {overlay:?}");
  };
  assert_ne!(previous, last);
  assert!((0..WRITERS).contains(&previous));
  assert!((0..WRITERS).contains(&last));
}

// ─── Ledger rows ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn recorded_observation_roundtrips() {
  let s = store().await;
  let id = item(&s, "a").await;

  let now = t0() + Duration::nanoseconds(123_456_789);
  let obs = s.record_observation(sample(id, "3.14", 9), now).await.unwrap();
  let fetched = s.get_observation(obs.observation_id).await.unwrap().unwrap();
  assert_eq!(fetched, obs);
}

#[tokio::test]
async fn find_window_is_inclusive_and_ordered() {
  let s = store().await;
  let id = item(&s, "a").await;

  let times = [
    t0() - Duration::minutes(1),
    t0(),
    t0() + Duration::minutes(30),
    t0() + Duration::hours(1),
    t0() + Duration::hours(1) + Duration::seconds(1),
  ];
  for at in times {
    s.record_observation(sample(id, "1", 1), at).await.unwrap();
  }

  let rows = s
    .find_window(id, t0(), t0() + Duration::hours(1))
    .await
    .unwrap();
  let got: Vec<_> = rows.iter().map(|o| o.registered_at).collect();
  assert_eq!(got, &times[1..4]);
}

#[tokio::test]
async fn edit_overwrites_fields_but_not_labels() {
  let s = store().await;
  let a = item(&s, "a").await;
  let b = item(&s, "b").await;
  let obs = s.record_observation(sample(a, "1.00", 1), t0()).await.unwrap();

  let moved_to = t0() - Duration::hours(2);
  s.edit_observation(obs.observation_id, ObservationPatch {
    registered_at: Some(moved_to),
    item_id:       Some(b),
    price:         Some("2.00".into()),
    count:         Some(7),
  })
  .await
  .unwrap();

  let fetched = s.get_observation(obs.observation_id).await.unwrap().unwrap();
  assert_eq!(fetched.registered_at, moved_to);
  assert_eq!(fetched.item_id, b);
  assert_eq!(fetched.price, "2.00");
  assert_eq!(fetched.count, 7);
  assert_eq!(fetched.labels, obs.labels);
}

#[tokio::test]
async fn edit_missing_observation_errors() {
  let s = store().await;

  let err = s
    .edit_observation(Uuid::new_v4(), ObservationPatch {
      count: Some(1),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::ObservationNotFound(_)));

  let err = s
    .edit_observation(Uuid::new_v4(), ObservationPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::ObservationNotFound(_)));
}

#[tokio::test]
async fn double_delete_fails() {
  let s = store().await;
  let id = item(&s, "a").await;
  let obs = s.record_observation(sample(id, "1", 1), t0()).await.unwrap();

  s.delete_observation(obs.observation_id).await.unwrap();
  assert!(s.get_observation(obs.observation_id).await.unwrap().is_none());

  let err = s.delete_observation(obs.observation_id).await.unwrap_err();
  assert!(matches!(err, crate::Error::ObservationNotFound(_)));
}

#[tokio::test]
async fn delete_realtime_drops_overlay_row() {
  let s = store().await;
  let id = item(&s, "a").await;
  s.record_observation(sample(id, "1", 1), t0()).await.unwrap();
  assert!(s.get_realtime(id).await.unwrap().is_some());

  s.delete_realtime(id).await.unwrap();
  assert!(s.get_realtime(id).await.unwrap().is_none());
  // Missing rows are fine.
  s.delete_realtime(id).await.unwrap();
}

#[tokio::test]
async fn overlay_tracks_only_latest_two() {
  let s = store().await;
  let id = item(&s, "a").await;

  for (i, price) in ["1.00", "2.00", "3.00"].into_iter().enumerate() {
    let at = t0() + Duration::minutes(i as i64);
    s.record_observation(sample(id, price, i as i64), at).await.unwrap();
  }

  let overlay = s.get_realtime(id).await.unwrap().unwrap();
  assert_eq!(overlay.previous_price.as_deref(), Some("2.00"));
  assert_eq!(overlay.previous_count, Some(1));
  assert_eq!(overlay.last_price, "3.00");
  assert_eq!(overlay.last_count, 2);
}

// ─── Ledger service ──────────────────────────────────────────────────────────

fn ledger_at(s: &SqliteStore, now: NaiveDateTime) -> Ledger<SqliteStore, FixedClock> {
  Ledger::with_clock(s.clone(), FixedClock(now))
}

#[tokio::test]
async fn history_filters_by_window_and_label() {
  let s = store().await;
  let id = item(&s, "a").await;
  let now = t0() + Duration::hours(12);

  let record = |at: NaiveDateTime| {
    let s = s.clone();
    async move { s.record_observation(sample(id, "1", 1), at).await.unwrap() }
  };
  let t1 = record(now - Duration::hours(30)).await; // all labels
  let t2 = record(now - Duration::hours(20)).await; // day, month
  let t3 = record(now - Duration::hours(20) + Duration::minutes(5)).await; // none
  let t4 = record(now - Duration::hours(1)).await; // day, month
  assert!(t3.labels.is_empty());

  let ledger = ledger_at(&s, now);
  let ids = |rows: Vec<overseer_core::observation::Observation>| {
    rows.into_iter().map(|o| o.observation_id).collect::<Vec<_>>()
  };

  let day = ledger.query_history(id, "day", None).await.unwrap();
  assert_eq!(ids(day), vec![t2.observation_id, t4.observation_id]);

  let month = ledger.query_history(id, " MONTH ", None).await.unwrap();
  assert_eq!(
    ids(month),
    vec![t1.observation_id, t2.observation_id, t4.observation_id]
  );

  let year = ledger.query_history(id, "year", None).await.unwrap();
  assert_eq!(ids(year), vec![t1.observation_id]);
}

#[tokio::test]
async fn year_offset_selects_preceding_block() {
  let s = store().await;
  let id = item(&s, "a").await;
  let now = NaiveDate::from_ymd_opt(2023, 6, 1)
    .unwrap()
    .and_hms_opt(12, 0, 0)
    .unwrap();

  let old = s
    .record_observation(sample(id, "1", 1), now - Duration::days(400))
    .await
    .unwrap();
  let recent = s
    .record_observation(sample(id, "2", 1), now - Duration::days(10))
    .await
    .unwrap();

  let ledger = ledger_at(&s, now);
  let current = ledger.query_history(id, "year", Some(0)).await.unwrap();
  assert_eq!(current, vec![recent]);

  let previous = ledger.query_history(id, "year", Some(1)).await.unwrap();
  assert_eq!(previous, vec![old]);

  let older = ledger.query_history(id, "year", Some(2)).await.unwrap();
  assert!(older.is_empty());
}

#[tokio::test]
async fn history_rejects_bad_period_and_offset() {
  let s = store().await;
  let ledger = ledger_at(&s, t0());

  let err = ledger
    .query_history(Uuid::new_v4(), "week", None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    overseer_core::Error::Validation(ValidationError::InvalidPeriod(_))
  ));

  let err = ledger
    .query_history(Uuid::new_v4(), "year", Some(-1))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    overseer_core::Error::Validation(ValidationError::InvalidYearOffset(-1))
  ));
}

#[tokio::test]
async fn ingest_validates_and_records() {
  let s = store().await;
  let id = item(&s, "a").await;
  let ledger = ledger_at(&s, t0());

  let obs = ledger.ingest(id, "10,50", 3).await.unwrap();
  assert_eq!(obs.price, "10.50");
  assert_eq!(obs.registered_at, t0());

  let latest = ledger.query_latest(id).await.unwrap().unwrap();
  assert_eq!(latest.last_price, "10.50");
  assert_eq!(latest.previous_price, None);

  let err = ledger.ingest(id, "12345678901", 1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  let err = ledger.ingest(id, "1e5", 1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  let err = ledger.ingest(id, "1.00", -1).await.unwrap_err();
  assert!(matches!(
    err,
    overseer_core::Error::Validation(ValidationError::InvalidCount(-1))
  ));
}

#[tokio::test]
async fn ingest_into_unknown_item_is_a_transaction_failure() {
  let s = store().await;
  let ledger = ledger_at(&s, t0());

  let err = ledger.ingest(Uuid::new_v4(), "1", 1).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Transaction);
}

#[tokio::test]
async fn correct_price_keeps_labels() {
  let s = store().await;
  let id = item(&s, "a").await;
  let ledger = ledger_at(&s, t0());

  let obs = ledger.ingest(id, "10.00", 1).await.unwrap();
  ledger
    .correct(obs.observation_id, ObservationPatch {
      price: Some("12.50".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  let fetched = ledger.find_one(obs.observation_id).await.unwrap().unwrap();
  assert_eq!(fetched.price, "12.50");
  assert_eq!(fetched.labels, obs.labels);
}

#[tokio::test]
async fn correct_rejects_bad_input_and_missing_rows() {
  let s = store().await;
  let id = item(&s, "a").await;
  let ledger = ledger_at(&s, t0());
  let obs = ledger.ingest(id, "10.00", 1).await.unwrap();

  let err = ledger
    .correct(obs.observation_id, ObservationPatch {
      price: Some("ten".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = ledger
    .correct(Uuid::new_v4(), ObservationPatch {
      count: Some(2),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn remove_twice_is_not_found() {
  let s = store().await;
  let id = item(&s, "a").await;
  let ledger = ledger_at(&s, t0());
  let obs = ledger.ingest(id, "1", 1).await.unwrap();

  ledger.remove(obs.observation_id).await.unwrap();
  let err = ledger.remove(obs.observation_id).await.unwrap_err();
  assert!(matches!(err, overseer_core::Error::ObservationNotFound(_)));
}
