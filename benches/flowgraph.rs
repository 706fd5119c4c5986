use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use flowrt::anyhow::Result;
use flowrt::blocks::MessageBurst;
use flowrt::blocks::MessageCopy;
use flowrt::blocks::MessageSink;
use flowrt::runtime::Flowgraph;
use flowrt::runtime::Pmt;
use flowrt::runtime::Runtime;
use flowrt::runtime::config;
use std::hint::black_box;

fn run_fg(n_messages: u64) -> Result<()> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(MessageBurst::new(Pmt::U32(0), n_messages));
    let copy = fg.add_block(MessageCopy::new());
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", copy, "in")?;
    fg.connect_message(copy, "out", snk, "in")?;

    let fg = Runtime::new().run(fg)?;
    assert_eq!(
        fg.kernel::<MessageSink>(snk).unwrap().received(),
        n_messages
    );
    Ok(())
}

pub fn flowgraph(c: &mut Criterion) {
    config::set("ctrlport_enable", false);

    let n_messages = 1000;

    let mut group = c.benchmark_group("flowgraph");

    group.throughput(criterion::Throughput::Elements(n_messages));

    group.bench_function(format!("messages-{n_messages}"), |b| {
        b.iter(|| {
            run_fg(black_box(n_messages)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, flowgraph);
criterion_main!(benches);
