use std::hint::black_box;

use backlog_core::model::item::{Priority, Status, SubItem, WorkItem};
use backlog_core::queue::stats::category_counts;
use backlog_core::queue::{QueueConfig, SortMode, StatusFilter, build_queue};
use backlog_core::snapshot::Snapshot;
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const SIZES: &[usize] = &[100, 1_000, 5_000];

/// Deterministic synthetic backlog: mixed priorities and statuses, a third of
/// items dated directly, some inheriting from subitems, and a sparse blocking web.
fn synthetic_snapshot(n: usize) -> Snapshot {
    let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
    let priorities = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];
    let statuses = [Status::Todo, Status::InProgress, Status::Todo, Status::Completed];
    let items = (0..n)
        .map(|i| {
            let date = base + chrono::Duration::days((i % 90) as i64);
            WorkItem {
                id: format!("BENCH-{i:05}"),
                title: format!("Synthetic item {i}"),
                priority: priorities[i % priorities.len()],
                status: statuses[i % statuses.len()],
                due_date: (i % 3 == 0).then_some(date),
                blocked_by: if i % 7 == 0 && i > 0 {
                    vec![format!("BENCH-{:05}", i - 1)]
                } else {
                    Vec::new()
                },
                tags: if i % 5 == 0 { vec!["ios".to_string()] } else { Vec::new() },
                subitems: (0..(i % 4))
                    .map(|j| SubItem {
                        id: format!("BENCH-{i:05}-{:03}", j + 1),
                        title: format!("Step {j}"),
                        status: statuses[(i + j) % statuses.len()],
                        due_date: Some(date + chrono::Duration::days(j as i64)),
                        time_worked_ms: Some(60_000),
                        ..SubItem::default()
                    })
                    .collect(),
                ..WorkItem::default()
            }
        })
        .collect();
    Snapshot { items }
}

fn bench_build_queue(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default();
    let mut group = c.benchmark_group("queue.build");

    for &size in SIZES {
        let snapshot = synthetic_snapshot(size);
        group.throughput(Throughput::Elements(size as u64));

        for sort in [SortMode::Priority, SortMode::DueDate] {
            let config = QueueConfig {
                sort,
                ..QueueConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::new(sort.to_string(), size),
                &snapshot,
                |b, snapshot| b.iter(|| black_box(build_queue(snapshot, &config, today))),
            );
        }

        let completed = QueueConfig {
            status: StatusFilter::Completed,
            ..QueueConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("completed_view", size),
            &snapshot,
            |b, snapshot| b.iter(|| black_box(build_queue(snapshot, &completed, today))),
        );

        group.bench_with_input(
            BenchmarkId::new("category_counts", size),
            &snapshot,
            |b, snapshot| b.iter(|| black_box(category_counts(&snapshot.items, today))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_build_queue);
criterion_main!(benches);
