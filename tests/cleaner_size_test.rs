// Total-size enforcement scenarios: convergence toward the cap, the grace
// stop, and the in-progress exclusions.

mod common;

use chrono::Duration;
use uuid::Uuid;

use backup_retention::catalog::{BackupRepository, BackupStatus};

use common::*;

#[tokio::test]
async fn under_limit_deletes_nothing() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 100;
    h.config_service.save_backup_config(config).await.unwrap();

    for i in 0..3 {
        let b = make_backup(db, h.storage_id, BackupStatus::Completed, 16.67, Duration::hours(i + 2));
        h.repository.save(b).await.unwrap();
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    assert_eq!(remaining_ids(&h.repository, db).await.len(), 3);
}

#[tokio::test]
async fn over_limit_deletes_oldest_until_under() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 30;
    h.config_service.save_backup_config(config).await.unwrap();

    // Five 10 MiB backups, oldest first in `backups`.
    let mut backups = Vec::new();
    for i in 0..5 {
        let b = make_backup(
            db,
            h.storage_id,
            BackupStatus::Completed,
            10.0,
            Duration::hours(6 - i),
        );
        h.repository.save(b.clone()).await.unwrap();
        backups.push(b);
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    // 50 MiB total converges to 30 by evicting the two oldest.
    let remaining = remaining_ids(&h.repository, db).await;
    assert_eq!(remaining.len(), 3);
    assert!(!remaining.contains(&backups[0].id));
    assert!(!remaining.contains(&backups[1].id));
    assert!(remaining.contains(&backups[2].id));
    assert!(remaining.contains(&backups[3].id));
    assert!(remaining.contains(&backups[4].id));
}

#[tokio::test]
async fn exactly_at_cap_deletes_nothing() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 30;
    h.config_service.save_backup_config(config).await.unwrap();

    for i in 0..3 {
        let b = make_backup(db, h.storage_id, BackupStatus::Completed, 10.0, Duration::hours(i + 2));
        h.repository.save(b).await.unwrap();
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    assert_eq!(remaining_ids(&h.repository, db).await.len(), 3);
}

#[tokio::test]
async fn just_over_cap_deletes_the_oldest() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 29;
    h.config_service.save_backup_config(config).await.unwrap();

    let oldest = make_backup(db, h.storage_id, BackupStatus::Completed, 10.0, Duration::hours(4));
    let mid = make_backup(db, h.storage_id, BackupStatus::Completed, 10.0, Duration::hours(3));
    let newest = make_backup(db, h.storage_id, BackupStatus::Completed, 10.0, Duration::hours(2));
    for b in [&oldest, &mid, &newest] {
        h.repository.save(b.clone()).await.unwrap();
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    let remaining = remaining_ids(&h.repository, db).await;
    assert_eq!(remaining, vec![newest.id, mid.id]);
}

#[tokio::test]
async fn zero_limit_means_unlimited() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 0;
    h.config_service.save_backup_config(config).await.unwrap();

    for i in 0..10 {
        let b = make_backup(db, h.storage_id, BackupStatus::Completed, 100.0, Duration::hours(i + 2));
        h.repository.save(b).await.unwrap();
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    assert_eq!(remaining_ids(&h.repository, db).await.len(), 10);
}

#[tokio::test]
async fn in_progress_backups_are_neither_counted_nor_deleted() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 50;
    h.config_service.save_backup_config(config).await.unwrap();

    let mut completed = Vec::new();
    for i in 0..3 {
        let b = make_backup(
            db,
            h.storage_id,
            BackupStatus::Completed,
            30.0,
            Duration::hours(4 - i),
        );
        h.repository.save(b.clone()).await.unwrap();
        completed.push(b);
    }
    // Huge in-progress backup; excluded from the total and from candidates.
    let in_progress = make_backup(db, h.storage_id, BackupStatus::InProgress, 500.0, Duration::hours(20));
    h.repository.save(in_progress.clone()).await.unwrap();

    h.cleaner.clean_exceeded_backups().await.unwrap();

    // 90 MiB of completed converges to 30 by dropping the two oldest; the
    // in-progress row stays.
    let remaining = remaining_ids(&h.repository, db).await;
    assert!(remaining.contains(&in_progress.id));
    assert!(remaining.contains(&completed[2].id));
    assert!(!remaining.contains(&completed[0].id));
    assert!(!remaining.contains(&completed[1].id));
}

#[tokio::test]
async fn recent_oldest_backup_stops_size_cleanup() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 10;
    h.config_service.save_backup_config(config).await.unwrap();

    // 16 MiB total over a 10 MiB cap, but both backups are inside the grace
    // window; the cleaner must stop rather than skip past the oldest.
    let older = make_backup(db, h.storage_id, BackupStatus::Completed, 8.0, Duration::minutes(30));
    let newer = make_backup(db, h.storage_id, BackupStatus::Completed, 8.0, Duration::minutes(10));
    h.repository.save(older.clone()).await.unwrap();
    h.repository.save(newer.clone()).await.unwrap();

    h.cleaner.clean_exceeded_backups().await.unwrap();

    assert_eq!(remaining_ids(&h.repository, db).await.len(), 2);
}

#[tokio::test]
async fn failed_backups_are_evicted_but_do_not_count_toward_total() {
    let h = harness();
    let db = Uuid::new_v4();

    let mut config = base_config(db, h.storage_id);
    config.max_backups_total_size_mb = 30;
    h.config_service.save_backup_config(config).await.unwrap();

    // The failed backup is the oldest candidate even though only completed
    // sizes count against the cap.
    let failed = make_backup(db, h.storage_id, BackupStatus::Failed, 5.0, Duration::hours(10));
    let old_completed = make_backup(db, h.storage_id, BackupStatus::Completed, 20.0, Duration::hours(5));
    let new_completed = make_backup(db, h.storage_id, BackupStatus::Completed, 20.0, Duration::hours(2));
    for b in [&failed, &old_completed, &new_completed] {
        h.repository.save(b.clone()).await.unwrap();
    }

    h.cleaner.clean_exceeded_backups().await.unwrap();

    // 40 MiB completed over a 30 MiB cap: the failed row goes first (no
    // effect on the total), then the oldest completed one.
    let remaining = remaining_ids(&h.repository, db).await;
    assert_eq!(remaining, vec![new_completed.id]);
}
