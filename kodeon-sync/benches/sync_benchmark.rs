use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use kodeon_sync::{DocumentId, EditOp, OpKind, SyncEngine, SyncEvent};
use std::sync::Arc;
use uuid::Uuid;

fn doc_id() -> DocumentId {
    DocumentId::new("bench", "main.kd")
}

fn bench_apply_insert_1kb(c: &mut Criterion) {
    let content = "x".repeat(1024);
    let kind = OpKind::Insert { text: "hello".into() };

    c.bench_function("apply_insert_1kb", |b| {
        b.iter(|| black_box(kind.apply_to(black_box(&content), 512).unwrap()))
    });
}

fn bench_edit_encode(c: &mut Criterion) {
    let edit = EditOp::insert(512, "let x = compute();", 42);

    c.bench_function("edit_encode", |b| {
        b.iter(|| black_box(edit.encode().unwrap()))
    });
}

fn bench_edit_decode(c: &mut Criterion) {
    let encoded = EditOp::insert(512, "let x = compute();", 42).encode().unwrap();

    c.bench_function("edit_decode", |b| {
        b.iter(|| black_box(EditOp::decode(black_box(&encoded)).unwrap()))
    });
}

fn bench_event_encode(c: &mut Criterion) {
    let event = SyncEvent::DocumentClosed { document: doc_id() };

    c.bench_function("event_encode", |b| {
        b.iter(|| black_box(event.encode().unwrap()))
    });
}

fn bench_submit_current_version(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let user = Uuid::new_v4();

    c.bench_function("submit_current_version", |b| {
        b.iter_batched(
            || {
                let engine = Arc::new(SyncEngine::with_null_sink());
                rt.block_on(engine.create_document("bench", "main.kd", "fn main() {}"))
                    .unwrap();
                engine
            },
            |engine| {
                rt.block_on(engine.submit_operation(
                    &doc_id(),
                    user,
                    EditOp::insert(0, "x", 0),
                ))
                .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_submit_stale_against_100_ops(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let user = Uuid::new_v4();

    c.bench_function("submit_stale_against_100_ops", |b| {
        b.iter_batched(
            || {
                let engine = Arc::new(SyncEngine::with_null_sink());
                rt.block_on(async {
                    engine.create_document("bench", "main.kd", "").await.unwrap();
                    for v in 0..100u64 {
                        engine
                            .submit_operation(&doc_id(), user, EditOp::insert(0, "y", v))
                            .await
                            .unwrap();
                    }
                });
                engine
            },
            // Base version 0: transformed against all 100 concurrent ops.
            |engine| {
                rt.block_on(engine.submit_operation(
                    &doc_id(),
                    user,
                    EditOp::insert(0, "x", 0),
                ))
                .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_apply_insert_1kb,
    bench_edit_encode,
    bench_edit_decode,
    bench_event_encode,
    bench_submit_current_version,
    bench_submit_stale_against_100_ops,
);
criterion_main!(benches);
