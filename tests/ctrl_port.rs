use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use flowrt::anyhow::Result;
use flowrt::anyhow::bail;
use flowrt::blocks::MessageSink;
use flowrt::blocks::MessageSourceBuilder;
use flowrt::runtime::Block;
use flowrt::runtime::BlockMeta;
use flowrt::runtime::BlockMetaBuilder;
use flowrt::runtime::Flowgraph;
use flowrt::runtime::Kernel;
use flowrt::runtime::MessageIo;
use flowrt::runtime::MessageIoBuilder;
use flowrt::runtime::Pmt;
use flowrt::runtime::Runtime;
use flowrt::runtime::config;

use flowrt_remote::Handler;
use flowrt_remote::Remote;

/// Scales incoming `F32` messages by an adjustable gain.
struct Fader {
    gain: f32,
}

impl Fader {
    fn new(gain: f32) -> Block {
        Block::new(
            BlockMetaBuilder::new("Fader").build(),
            MessageIoBuilder::new()
                .add_async_input("in", Fader::scale)
                .add_sync_input(
                    "gain",
                    |block: &mut Fader,
                     _mio: &mut MessageIo<Fader>,
                     _meta: &mut BlockMeta,
                     p: Pmt| match p {
                        Pmt::Null => Ok(Pmt::F32(block.gain)),
                        Pmt::F32(g) => {
                            block.gain = g;
                            Ok(Pmt::F32(g))
                        }
                        _ => bail!("gain handler expects Pmt::F32"),
                    },
                )
                .add_output("out")
                .build(),
            Fader { gain },
        )
    }

    fn scale<'a>(
        block: &'a mut Fader,
        mio: &'a mut MessageIo<Fader>,
        _meta: &'a mut BlockMeta,
        p: Pmt,
    ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>> {
        Box::pin(async move {
            match p {
                Pmt::F32(v) => {
                    mio.post(0, Pmt::F32(v * block.gain)).await;
                    Ok(Pmt::Ok)
                }
                Pmt::Null => Ok(Pmt::Null),
                _ => Ok(Pmt::InvalidValue),
            }
        })
    }
}

impl Kernel for Fader {}

fn fader_fg() -> Result<Flowgraph> {
    let mut fg = Flowgraph::new();
    fg.set_name("fader");

    let fader = fg.add_block(Fader::new(1.0));
    let src = fg.add_block(
        // long interval, so the source does not interfere with gain reads
        MessageSourceBuilder::new(Pmt::F32(0.5), Duration::from_secs(60)).build(),
    );
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", fader, "in")?;
    fg.connect_message(fader, "out", snk, "in")?;

    Ok(fg)
}

#[test]
fn ctrl_port_api() -> Result<()> {
    config::set("ctrlport_bind", "127.0.0.1:0");

    let rt = Runtime::new();
    let (_task, _handle) = rt.start_sync(fader_fg()?)?;
    let addr = rt.ctrl_port_addr().expect("control port disabled");
    let url = format!("http://{}", addr);

    let tokio_rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_rt.block_on(async move {
        let remote = Remote::new(url);

        let fgs = remote.flowgraphs().await.unwrap();
        assert_eq!(fgs.len(), 1);

        let fg = remote.flowgraph(0).await.unwrap();
        assert_eq!(fg.description().name, "fader");
        assert_eq!(fg.description().blocks.len(), 3);
        assert_eq!(fg.description().message_edges.len(), 2);

        let block = fg.block(0).unwrap();
        assert_eq!(block.description().type_name, "Fader");
        assert_eq!(
            block.description().message_inputs,
            vec!["in".to_string(), "gain".to_string()]
        );

        // handlers resolve by index and by name
        let ret = block.call(Handler::Id(0)).await.unwrap();
        assert_eq!(ret, Pmt::Null);
        let ret = block.call(Handler::Name("gain".to_string())).await.unwrap();
        assert_eq!(ret, Pmt::F32(1.0));

        // read-style calls with Null are idempotent
        let ret = block.call(Handler::Name("gain".to_string())).await.unwrap();
        assert_eq!(ret, Pmt::F32(1.0));

        // mutate the gain and read it back, once by name, once by index
        let ret = block
            .callback(Handler::Name("gain".to_string()), Pmt::F32(30.0))
            .await
            .unwrap();
        assert_eq!(ret, Pmt::F32(30.0));
        let ret = block.call(Handler::Name("gain".to_string())).await.unwrap();
        assert_eq!(ret, Pmt::F32(30.0));
        let ret = block.call(Handler::Id(1)).await.unwrap();
        assert_eq!(ret, Pmt::F32(30.0));
    });

    Ok(())
}

#[test]
fn ctrl_port_errors() -> Result<()> {
    config::set("ctrlport_bind", "127.0.0.1:0");

    let rt = Runtime::new();
    let (_task, _handle) = rt.start_sync(fader_fg()?)?;
    let addr = rt.ctrl_port_addr().expect("control port disabled");

    let tokio_rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_rt.block_on(async move {
        let client = reqwest::Client::new();

        // unknown flowgraph
        let res = client
            .get(format!("http://{}/api/fg/123/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

        // unknown block
        let res = client
            .get(format!("http://{}/api/fg/0/block/9999/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

        // unknown handler, addressed by index and by name
        let res = client
            .get(format!("http://{}/api/fg/0/block/9999/call/gain/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
        let res = client
            .get(format!("http://{}/api/fg/0/block/0/call/4711/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
        let res = client
            .get(format!("http://{}/api/fg/0/block/0/call/nope/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

        // wrong variant is rejected by the handler
        let res = client
            .post(format!("http://{}/api/fg/0/block/0/call/gain/", addr))
            .json(&serde_json::json!({ "String": "loud" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

        // malformed typed value does not decode
        let res = client
            .post(format!("http://{}/api/fg/0/block/0/call/gain/", addr))
            .header("content-type", "application/json")
            .body("{\"NoSuchTag\": 1}")
            .send()
            .await
            .unwrap();
        assert!(res.status().is_client_error());

        // the gain is still intact
        let v: serde_json::Value = client
            .get(format!("http://{}/api/fg/0/block/0/call/gain/", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!({ "F32": 1.0 }));
    });

    Ok(())
}

#[test]
fn ctrl_port_wire_format() -> Result<()> {
    config::set("ctrlport_bind", "127.0.0.1:0");

    let rt = Runtime::new();
    let (_task, _handle) = rt.start_sync(fader_fg()?)?;
    let addr = rt.ctrl_port_addr().expect("control port disabled");

    let tokio_rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_rt.block_on(async move {
        let client = reqwest::Client::new();

        // flowgraph listing carries id and name
        let v: serde_json::Value = client
            .get(format!("http://{}/api/fg/", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!([{ "id": 0, "name": "fader" }]));

        // calling a handler with Null returns an explicit "Null"
        let v: serde_json::Value = client
            .get(format!("http://{}/api/fg/0/block/0/call/0/", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!("Null"));

        // a posted {"F32": ...} comes back as {"F32": ...}
        let v: serde_json::Value = client
            .post(format!("http://{}/api/fg/0/block/0/call/gain/", addr))
            .json(&serde_json::json!({ "F32": 30.0 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!({ "F32": 30.0 }));

        // block description lists the handler set
        let v: serde_json::Value = client
            .get(format!("http://{}/api/fg/0/block/0/", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(v["id"], serde_json::json!(0));
        assert_eq!(v["type_name"], serde_json::json!("Fader"));
        assert_eq!(v["message_inputs"], serde_json::json!(["in", "gain"]));
    });

    Ok(())
}
