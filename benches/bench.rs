// Criterion benchmarks for Roomie

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roomie::core::{
    classify_release, CandidateQueue, Command, DragRelease, GestureConfig, MatchingSession,
    SessionEvent,
};
use roomie::models::{Candidate, GeoScope, SwipeAction, SwipeResponse};

fn create_candidate(id: usize) -> Candidate {
    serde_json::from_value(serde_json::json!({
        "id": format!("user-{}", id),
        "full_name": format!("User {}", id),
        "match_score": (id % 101) as u8,
    }))
    .unwrap()
}

fn create_candidates(count: usize) -> Vec<Candidate> {
    (0..count).map(create_candidate).collect()
}

fn bench_classify_release(c: &mut Criterion) {
    let config = GestureConfig::default();
    c.bench_function("classify_release", |b| {
        b.iter(|| classify_release(&config, black_box(101.0), black_box(-420.0)));
    });
}

fn bench_queue_replace_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_replace_and_drain");

    for size in [20, 100, 500].iter() {
        let candidates = create_candidates(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut queue = CandidateQueue::new();
                queue.replace_all(black_box(candidates.clone()));
                while let Some(id) = queue.peek_head().map(|c| c.id.clone()) {
                    queue.remove_by_id(&id);
                }
                queue.is_exhausted()
            });
        });
    }

    group.finish();
}

fn bench_session_swipe_cycle(c: &mut Criterion) {
    let candidates = create_candidates(50);

    c.bench_function("session_swipe_cycle_50", |b| {
        b.iter(|| {
            let mut session = MatchingSession::default();
            session.apply(SessionEvent::ScopeActivated(GeoScope::new(40.99, 29.03, "Kadıköy")));
            let fetch_id = match session.apply(SessionEvent::FetchRequested).first() {
                Some(Command::FetchCandidates { fetch_id, .. }) => *fetch_id,
                _ => return 0,
            };
            session.apply(SessionEvent::CandidatesLoaded {
                fetch_id,
                result: Ok(candidates.clone()),
            });

            while !session.is_exhausted() {
                let Some(Command::Animate(DragRelease::Commit { id, .. })) = session
                    .apply(SessionEvent::ButtonPressed(SwipeAction::Like))
                    .into_iter()
                    .next()
                else {
                    break;
                };
                let Some(Command::SubmitSwipe(submission)) =
                    session.apply(SessionEvent::AnimationFinished(id)).into_iter().next()
                else {
                    break;
                };
                session.apply(SessionEvent::SwipeCompleted {
                    submission,
                    reply: Ok(SwipeResponse::no_match()),
                });
            }
            black_box(session.queue().len())
        });
    });
}

criterion_group!(
    benches,
    bench_classify_release,
    bench_queue_replace_and_drain,
    bench_session_swipe_cycle
);
criterion_main!(benches);
