use flowrt_remote::Error;
use flowrt_remote::Handler;
use flowrt_remote::Remote;
use flowrt_types::Pmt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let remote = Remote::new("http://127.0.0.1:1337");

    println!("all flowgraphs");
    let fgs = remote.flowgraphs().await?;
    for fg in &fgs {
        println!("{}", fg);
    }

    println!("description of flowgraph 0");
    let fg = remote.flowgraph(0).await?;
    println!("{}", serde_json::to_string_pretty(fg.description()).unwrap());

    println!("description of block 0 (of flowgraph 0)");
    let block = fg.blocks().into_iter().next().expect("flowgraph is empty");
    println!(
        "{}",
        serde_json::to_string_pretty(block.description()).unwrap()
    );

    println!("call message handler 0 of block 0 w/ Pmt::Null");
    let ret = block.call(Handler::Id(0)).await?;
    println!("{:?}", ret);

    println!("call message handler 'gain' of block 0 w/ Pmt::Null");
    let ret = block.call(Handler::Name("gain".to_string())).await?;
    println!("{:?}", ret);

    println!("call message handler 'gain' of block 0 w/ Pmt::F32(30.0)");
    let ret = block
        .callback(Handler::Name("gain".to_string()), Pmt::F32(30.0))
        .await?;
    println!("{:?}", ret);

    Ok(())
}
