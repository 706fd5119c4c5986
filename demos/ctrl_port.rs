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

/// Scales incoming `F32` messages by an adjustable gain.
///
/// The `gain` handler returns the current gain when called with `Pmt::Null`
/// and updates it when called with a `Pmt::F32`, e.g. remotely via
///
/// ```text
/// curl -X POST -d '{"F32": 30.0}' http://127.0.0.1:1337/api/fg/0/block/0/call/gain/
/// ```
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

fn main() -> Result<()> {
    let mut fg = Flowgraph::new();
    fg.set_name("fader");

    let fader = fg.add_block(Fader::new(1.0));
    let src = fg.add_block(
        MessageSourceBuilder::new(Pmt::F32(0.5), Duration::from_secs(1)).build(),
    );
    let snk = fg.add_block(MessageSink::new());

    fg.connect_message(src, "out", fader, "in")?;
    fg.connect_message(fader, "out", snk, "in")?;

    println!("flowgraph listing at http://127.0.0.1:1337/api/fg/");
    Runtime::new().run(fg)?;

    Ok(())
}
