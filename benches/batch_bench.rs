use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use netframe::core::buffer::ByteBuffer;
use netframe::protocol::frame::{combine, encode_frame, split_items};
use netframe::protocol::queue::{QueueBuffer, QueueItem};
use netframe::transport::ChannelTransport;
use netframe::utils::cipher::obfuscate;
use std::sync::Arc;

fn items(count: usize, size: usize) -> Vec<QueueItem> {
    (0..count)
        .map(|i| {
            let mut payload = ByteBuffer::with_capacity(size);
            payload.put_uint32(i as u32);
            payload.put_slice(&vec![0x11; size.saturating_sub(4)]);
            QueueItem::new((i % 200) as u8, payload)
        })
        .collect()
}

fn bench_combine_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_split");

    for &(count, size) in &[(8usize, 64usize), (64, 512), (512, 1024)] {
        let batch = items(count, size);
        let frame = encode_frame(0xFF, combine(&batch).as_slice());
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_function(format!("combine_{count}x{size}"), |b| {
            b.iter(|| combine(&batch))
        });
        group.bench_function(format!("split_{count}x{size}"), |b| {
            b.iter(|| split_items(&frame))
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_enqueue_flush(c: &mut Criterion) {
    let batch = items(256, 256);
    c.bench_function("enqueue_flush_256", |b| {
        b.iter_batched(
            || {
                let (transport, rx) = ChannelTransport::pair();
                let queue = QueueBuffer::new().with_transport(Arc::new(transport));
                (queue, rx, batch.clone())
            },
            |(mut queue, mut rx, batch)| {
                for item in batch {
                    queue.enqueue(item.packet_type, item.buffer);
                }
                queue.flush().unwrap();
                rx.drain()
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_obfuscate(c: &mut Criterion) {
    let data = vec![0x5A; 64 * 1024];
    let mut group = c.benchmark_group("obfuscate");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("64k", |b| b.iter(|| obfuscate(&data, "session-key")));
    group.finish();
}

criterion_group!(benches, bench_combine_split, bench_enqueue_flush, bench_obfuscate);
criterion_main!(benches);
