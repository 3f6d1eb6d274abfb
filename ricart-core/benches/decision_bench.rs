use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};

use ricart_core::clock::LogicalClock;
use ricart_core::scheduler::ReplyScheduler;
use ricart_core::state::ClientState;
use ricart_core::types::*;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn make_request(requester: u32, ts: u64) -> ResourceRequest {
    ResourceRequest::new(ClientId(requester), ResourceName::from("file1.txt"), Timestamp(ts))
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_clock(c: &mut Criterion) {
    c.bench_function("clock_tick_observe", |b| {
        let mut clock = LogicalClock::new();
        b.iter(|| {
            clock.observe(black_box(Timestamp(7)));
            clock.tick()
        })
    });
}

fn bench_reply_decide(c: &mut Criterion) {
    let own = make_request(1, 100);
    let incoming = make_request(2, 100);

    c.bench_function("reply_scheduler_decide", |b| {
        b.iter(|| {
            ReplyScheduler::decide(
                black_box(PendingState::Requesting),
                black_box(Some(&own)),
                black_box(&incoming),
            )
        })
    });
}

fn bench_receive_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("receive_requests_while_holding");

    for peers in [10u32, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(peers), &peers, |b, &peers| {
            b.iter(|| {
                let mut state = ClientState::new(ClientId(0), (0..=peers).map(ClientId));
                let resource = ResourceName::from("file1.txt");
                state.begin(resource.clone()).ok();
                for peer in 1..=peers {
                    state.receive(&Message::acknowledge(ClientId(peer), resource.clone()));
                }
                for peer in 1..=peers {
                    state.receive(&Message::Request {
                        from: ClientId(peer),
                        resource: resource.clone(),
                        timestamp: Timestamp(peer as u64),
                    });
                }
                black_box(state.release(&resource).map(|r| r.len()).unwrap_or(0))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clock, bench_reply_decide, bench_receive_requests);
criterion_main!(benches);
