use serde::{Deserialize, Serialize};

use crate::FlowgraphId;

/// Summary of a `Flowgraph`, as returned by the listing endpoint of the
/// REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowgraphSummary {
    /// Id
    pub id: FlowgraphId,
    /// Name
    pub name: String,
}

/// Description of a `Flowgraph`.
///
/// This struct can be serialized to be used with the REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowgraphDescription {
    /// Name
    pub name: String,
    /// Blocks
    pub blocks: Vec<BlockDescription>,
    /// Message edges (source block, source port, destination block,
    /// destination port)
    pub message_edges: Vec<(usize, usize, usize, usize)>,
}

/// Description of a `Block`.
///
/// This struct can be serialized to be used with the REST API. The
/// `message_inputs` list is the block's handler set; handlers are
/// addressable by their position in this list or by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDescription {
    /// Id
    pub id: usize,
    /// Type name
    pub type_name: String,
    /// Instance name
    pub instance_name: String,
    /// Message inputs
    pub message_inputs: Vec<String>,
    /// Message outputs
    pub message_outputs: Vec<String>,
    /// Blocking
    ///
    /// Blocking blocks have an async API but are spawned in a separate thread, i.e., it is ok to
    /// block inside the async function.
    pub blocking: bool,
}
