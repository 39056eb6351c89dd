use std::time::Duration;

use broker::{InMemoryBroker, MessageBroker, MessageBrokerExt, QueueOptions, ReplyWaiter};
use common::{StockCheckReply, StockCheckRequest};
use criterion::{Criterion, criterion_group, criterion_main};
use futures_util::StreamExt;

fn bench_publish(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let broker = InMemoryBroker::new();
    rt.block_on(async {
        broker
            .declare("bench", QueueOptions::durable())
            .await
            .unwrap();
    });
    // Keep a consumer draining so the queue does not grow without bound.
    let mut drain = rt.block_on(broker.subscribe("bench")).unwrap();
    rt.spawn(async move { while drain.next().await.is_some() {} });

    let request = StockCheckRequest {
        product_id: 101,
        quantity: 3,
    };

    c.bench_function("broker/publish_json", |b| {
        b.iter(|| {
            rt.block_on(async {
                broker.publish_json("bench", &request).await.unwrap();
            });
        });
    });
}

fn bench_rpc_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let broker = InMemoryBroker::new();
    rt.block_on(async {
        broker
            .declare("check_stock", QueueOptions::durable())
            .await
            .unwrap();
        let mut requests = broker.subscribe("check_stock").await.unwrap();
        let responder = broker.clone();
        tokio::spawn(async move {
            while let Some(request) = requests.next().await {
                let body: StockCheckRequest = request.decode().unwrap();
                let reply = request
                    .reply_with(&StockCheckReply {
                        product_id: body.product_id,
                        is_available: true,
                    })
                    .unwrap()
                    .unwrap();
                responder.publish(reply).await.unwrap();
            }
        });
    });

    let waiter = ReplyWaiter::new(broker);
    let request = StockCheckRequest {
        product_id: 101,
        quantity: 3,
    };

    c.bench_function("rpc/stock_check_round_trip", |b| {
        b.iter(|| {
            rt.block_on(async {
                let _: StockCheckReply = waiter
                    .call("check_stock", &request, Duration::from_secs(1))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_publish, bench_rpc_round_trip);
criterion_main!(benches);
