use ringdisruptor_rs::{init_tracing, Builder, Config};
use std::thread;
use std::time::Instant;

fn main() {
    init_tracing();

    println!("RingDisruptor Pipeline Example");
    println!("==============================\n");

    let config = Config::new(
        1 << 12, // 4K slots
        true,    // metrics enabled to show wait behaviour
    );

    const N_PRODUCERS: u64 = 4;
    const ITEMS_PER_PRODUCER: u64 = 250_000;
    const TOTAL: u64 = N_PRODUCERS * ITEMS_PER_PRODUCER;

    let (producer, mut consumer) = Builder::<[u64; 2]>::new()
        .with_config(config)
        .build_multi_producer()
        .expect("4096 is a power of two");

    println!("Configuration:");
    println!("  Ring capacity: {} slots", producer.capacity());
    println!("  Producers: {}", N_PRODUCERS);
    println!("  Items per producer: {}", ITEMS_PER_PRODUCER);
    println!("  Total items: {}\n", TOTAL);

    let start = Instant::now();

    let handles: Vec<_> = (0..N_PRODUCERS)
        .map(|id| {
            let p = producer.clone();
            thread::spawn(move || {
                for seq in 0..ITEMS_PER_PRODUCER {
                    p.produce([id, seq]);
                }
            })
        })
        .collect();

    // Drain in batches; fall back to a blocking consume when idle
    let mut next_expected = [0u64; N_PRODUCERS as usize];
    let mut received = 0;
    while received < TOTAL {
        let mut check = |[id, seq]: [u64; 2]| {
            assert_eq!(seq, next_expected[id as usize], "producer {} out of order", id);
            next_expected[id as usize] += 1;
        };
        let n = consumer.consume_batch(&mut check) as u64;
        if n == 0 {
            check(consumer.consume());
            received += 1;
        } else {
            received += n;
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let elapsed = start.elapsed();
    let metrics = consumer.metrics();

    println!("Results:");
    println!("  Received: {} items in {:?}", received, elapsed);
    println!(
        "  Throughput: {:.2} M items/sec",
        received as f64 / elapsed.as_secs_f64() / 1e6
    );
    println!("  Producer waits (buffer full): {}", metrics.producer_waits);
    println!("  Consumer waits (buffer empty): {}", metrics.consumer_waits);
    println!("  Publish retries (out-of-order): {}", metrics.publish_retries);
}
