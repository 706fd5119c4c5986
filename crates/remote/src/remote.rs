use flowrt_types::BlockDescription;
use flowrt_types::FlowgraphDescription;
use flowrt_types::FlowgraphSummary;
use flowrt_types::Pmt;
use serde::de::DeserializeOwned;

use crate::Error;

async fn get<T: DeserializeOwned>(client: &reqwest::Client, url: String) -> Result<T, Error> {
    let res = client.get(&url).send().await?;
    if !res.status().is_success() {
        return Err(Error::Endpoint {
            url,
            status: res.status(),
        });
    }
    Ok(res.json().await?)
}

/// Connection to a remote runtime.
#[derive(Clone, Debug)]
pub struct Remote {
    client: reqwest::Client,
    url: String,
}

impl Remote {
    /// Create a [`Remote`], given the base URL of the runtime (e.g.
    /// `http://127.0.0.1:1337`).
    pub fn new<I: Into<String>>(url: I) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Get a specific [`Flowgraph`].
    pub async fn flowgraph(&self, id: usize) -> Result<Flowgraph, Error> {
        let fgs = self.flowgraphs().await?;
        fgs.into_iter()
            .find(|x| x.id == id)
            .ok_or(Error::FlowgraphId(id))
    }

    /// Get a list of all running [`Flowgraphs`](Flowgraph).
    pub async fn flowgraphs(&self) -> Result<Vec<Flowgraph>, Error> {
        let summaries: Vec<FlowgraphSummary> =
            get(&self.client, format!("{}/api/fg/", self.url)).await?;

        let mut v = Vec::new();
        for s in summaries.into_iter() {
            let fg: FlowgraphDescription =
                get(&self.client, format!("{}/api/fg/{}/", self.url, s.id.0)).await?;
            v.push(Flowgraph {
                id: s.id.0,
                description: fg,
                client: self.client.clone(),
                url: self.url.clone(),
            });
        }

        Ok(v)
    }
}

/// A remote Flowgraph.
#[derive(Clone, Debug)]
pub struct Flowgraph {
    id: usize,
    description: FlowgraphDescription,
    client: reqwest::Client,
    url: String,
}

impl Flowgraph {
    /// Update the [`Flowgraph`], getting current blocks and connections.
    pub async fn update(&mut self) -> Result<(), Error> {
        self.description = get(&self.client, format!("{}/api/fg/{}/", self.url, self.id)).await?;
        Ok(())
    }

    /// Get the [`FlowgraphDescription`].
    pub fn description(&self) -> &FlowgraphDescription {
        &self.description
    }

    /// Get a list of the [`Blocks`](Block) of the [`Flowgraph`].
    pub fn blocks(&self) -> Vec<Block> {
        self.description
            .blocks
            .iter()
            .map(|d| Block {
                description: d.clone(),
                client: self.client.clone(),
                url: self.url.clone(),
                flowgraph_id: self.id,
            })
            .collect()
    }

    /// Get a specific [`Block`](Block) of the [`Flowgraph`].
    pub fn block(&self, id: usize) -> Option<Block> {
        self.description
            .blocks
            .iter()
            .find(|x| x.id == id)
            .map(|d| Block {
                description: d.clone(),
                client: self.client.clone(),
                url: self.url.clone(),
                flowgraph_id: self.id,
            })
    }

    /// Get a list of all message [`Connections`](Connection) of the [`Flowgraph`].
    pub fn message_connections(&self) -> Vec<Connection> {
        self.description
            .message_edges
            .iter()
            .filter_map(|d| {
                Some(Connection {
                    src_block: self.block(d.0)?,
                    src_port: d.1,
                    dst_block: self.block(d.2)?,
                    dst_port: d.3,
                })
            })
            .collect()
    }
}

impl std::fmt::Display for Flowgraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Flowgraph {} ({}, B {} / M {})",
            self.id,
            self.description.name,
            self.description.blocks.len(),
            self.description.message_edges.len()
        )
    }
}

/// Specify a message handler of a [`Block`]
#[derive(Clone, Debug)]
pub enum Handler {
    /// Numeric ID of the handler
    Id(usize),
    /// Name of the handler
    Name(String),
}

/// A [`Block`] of a [`Flowgraph`].
#[derive(Clone, Debug)]
pub struct Block {
    description: BlockDescription,
    client: reqwest::Client,
    url: String,
    flowgraph_id: usize,
}

impl Block {
    /// Update the [`Block`], retrieving a new [`BlockDescription`] from the [`Flowgraph`].
    pub async fn update(&mut self) -> Result<(), Error> {
        self.description = get(
            &self.client,
            format!(
                "{}/api/fg/{}/block/{}/",
                self.url, self.flowgraph_id, self.description.id
            ),
        )
        .await?;
        Ok(())
    }

    /// Get the [`BlockDescription`].
    pub fn description(&self) -> &BlockDescription {
        &self.description
    }

    /// Call a message handler of a [`Block`], providing it a
    /// [`Pmt::Null`](flowrt_types::Pmt).
    ///
    /// This is usually used, when the caller is only interested in the return value. The handler
    /// might, for example, just return a parameter (think `get_frequency`, `get_gain`, etc).
    pub async fn call(&self, handler: Handler) -> Result<Pmt, Error> {
        let url = self.handler_url(&handler);
        get(&self.client, url).await
    }

    /// Call a message handler of a [`Block`] with the given [`Pmt`](flowrt_types::Pmt).
    pub async fn callback(&self, handler: Handler, pmt: Pmt) -> Result<Pmt, Error> {
        let url = self.handler_url(&handler);
        let res = self.client.post(&url).json(&pmt).send().await?;
        if !res.status().is_success() {
            return Err(Error::Endpoint {
                url,
                status: res.status(),
            });
        }
        Ok(res.json().await?)
    }

    fn handler_url(&self, handler: &Handler) -> String {
        match handler {
            Handler::Name(n) => format!(
                "{}/api/fg/{}/block/{}/call/{}/",
                &self.url, self.flowgraph_id, self.description.id, n
            ),
            Handler::Id(i) => format!(
                "{}/api/fg/{}/block/{}/call/{}/",
                &self.url, self.flowgraph_id, self.description.id, i
            ),
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            &self.description.instance_name, &self.description.type_name, self.description.id,
        )
    }
}

/// A message connection between [`Blocks`](Block)
#[derive(Clone, Debug)]
pub struct Connection {
    src_block: Block,
    src_port: usize,
    dst_block: Block,
    dst_port: usize,
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} | {}.{}",
            self.src_block.description.instance_name,
            &self.src_block.description.message_outputs[self.src_port],
            self.dst_block.description.instance_name,
            &self.dst_block.description.message_inputs[self.dst_port]
        )
    }
}
