use flowrt::anyhow::Result;
use flowrt::async_io::block_on;
use flowrt::blocks::MessageApply;
use flowrt::blocks::MessageBurst;
use flowrt::blocks::MessageCopy;
use flowrt::blocks::MessageSink;
use flowrt::blocks::MessageSourceBuilder;
use flowrt::runtime::BlockId;
use flowrt::runtime::Error;
use flowrt::runtime::Flowgraph;
use flowrt::runtime::Pmt;
use flowrt::runtime::PortId;
use flowrt::runtime::Runtime;
use std::time::Duration;

#[test]
fn fg_burst_terminates() -> Result<()> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(MessageBurst::new(Pmt::U32(123), 100));
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", snk, "in")?;

    let fg = Runtime::new().run(fg)?;

    let snk = fg.kernel::<MessageSink>(snk).unwrap();
    assert_eq!(snk.received(), 100);

    Ok(())
}

#[test]
fn fg_source_copy_sink() -> Result<()> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(
        MessageSourceBuilder::new(Pmt::String("foo".to_string()), Duration::from_millis(10))
            .n_messages(20)
            .build(),
    );
    let copy = fg.add_block(MessageCopy::new());
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", copy, "in")?;
    fg.connect_message(copy, "out", snk, "in")?;

    let fg = Runtime::new().run(fg)?;

    let snk = fg.kernel::<MessageSink>(snk).unwrap();
    assert_eq!(snk.received(), 20);

    Ok(())
}

#[test]
fn fg_apply() -> Result<()> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(MessageBurst::new(Pmt::U32(41), 10));
    let apply = fg.add_block(MessageApply::new(|p| match p {
        Pmt::U32(v) => Ok(Some(Pmt::U32(v + 1))),
        _ => Ok(None),
    }));
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", apply, "in")?;
    fg.connect_message(apply, "out", snk, "in")?;

    let fg = Runtime::new().run(fg)?;

    let snk = fg.kernel::<MessageSink>(snk).unwrap();
    assert_eq!(snk.received(), 10);

    Ok(())
}

#[test]
fn fg_terminate() -> Result<()> {
    let mut fg = Flowgraph::new();

    let src = fg.add_block(
        MessageSourceBuilder::new(Pmt::U32(0), Duration::from_millis(10)).build(),
    );
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", snk, "in")?;

    let rt = Runtime::new();
    let (fg, mut handle) = rt.start_sync(fg)?;
    block_on(async move {
        flowrt::async_io::Timer::after(Duration::from_millis(200)).await;
        handle.terminate().await.unwrap();
        let _ = fg.await;
    });

    Ok(())
}

#[test]
fn fg_callback() -> Result<()> {
    let mut fg = Flowgraph::new();

    // long interval, so the source does not interfere with the counts below
    let src = fg.add_block(
        MessageSourceBuilder::new(Pmt::U32(0), Duration::from_secs(60)).build(),
    );
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", snk, "in")?;

    let rt = Runtime::new();
    let (_task, mut handle) = rt.start_sync(fg)?;

    rt.block_on(async move {
        // by name
        let ret = handle
            .callback(BlockId(snk), PortId::Name("in".to_string()), Pmt::Null)
            .await
            .unwrap();
        assert_eq!(ret, Pmt::U64(1));

        // by index, hitting the same handler
        let ret = handle
            .callback(BlockId(snk), PortId::Index(0), Pmt::Null)
            .await
            .unwrap();
        assert_eq!(ret, Pmt::U64(2));

        // fire-and-forget call, visible to the next callback
        handle
            .call(BlockId(snk), PortId::Index(0), Pmt::U32(7))
            .await
            .unwrap();
        let ret = handle
            .callback(BlockId(snk), PortId::Index(0), Pmt::Null)
            .await
            .unwrap();
        assert_eq!(ret, Pmt::U64(4));

        // unknown handler
        let ret = handle
            .callback(BlockId(snk), PortId::Name("nope".to_string()), Pmt::Null)
            .await;
        assert!(matches!(ret, Err(Error::InvalidMessagePort(..))));

        // unknown block
        let ret = handle
            .callback(BlockId(99), PortId::Index(0), Pmt::Null)
            .await;
        assert!(matches!(ret, Err(Error::InvalidBlock(..))));

        handle.terminate().await.unwrap();
    });

    Ok(())
}

#[test]
fn fg_description() -> Result<()> {
    let mut fg = Flowgraph::new();
    fg.set_name("demo");

    let src = fg.add_block(
        MessageSourceBuilder::new(Pmt::U32(0), Duration::from_secs(60)).build(),
    );
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", snk, "in")?;

    let rt = Runtime::new();
    let (_task, mut handle) = rt.start_sync(fg)?;

    rt.block_on(async move {
        let d = handle.description().await.unwrap();
        assert_eq!(d.name, "demo");
        assert_eq!(d.blocks.len(), 2);
        assert_eq!(d.message_edges, vec![(src, 0, snk, 0)]);
        assert_eq!(d.blocks[0].instance_name, "MessageSource_0");
        assert_eq!(d.blocks[1].instance_name, "MessageSink_0");

        let b = handle.block_description(BlockId(snk)).await.unwrap();
        assert_eq!(b.type_name, "MessageSink");
        assert_eq!(b.message_inputs, vec!["in".to_string()]);
        assert!(b.message_outputs.is_empty());
        assert!(!b.blocking);

        let b = handle.block_description(BlockId(4711)).await;
        assert!(matches!(b, Err(Error::InvalidBlock(..))));

        handle.terminate().await.unwrap();
    });

    Ok(())
}
