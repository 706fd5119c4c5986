//! Message ports of a block
//!
//! Message inputs are named handlers, registered as sync or async closures.
//! Message outputs post [`Pmt`]s to the handlers of connected blocks.
use anyhow::Result;
use futures::channel::mpsc::Sender;
use futures::prelude::*;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::runtime::BlockMessage;
use crate::runtime::BlockMeta;
use crate::runtime::Pmt;
use crate::runtime::PortId;

/// Message input port, i.e., a named handler
pub enum MessageInput<T: Send + ?Sized> {
    /// Sync handler
    Sync(SyncMessageInput<T>),
    /// Async handler
    Async(AsyncMessageInput<T>),
}

impl<T: Send + ?Sized> MessageInput<T> {
    fn name(&self) -> &str {
        match self {
            MessageInput::Sync(i) => i.name(),
            MessageInput::Async(i) => i.name(),
        }
    }
}

/// Message input port with a sync handler
pub struct SyncMessageInput<T: Send + ?Sized> {
    name: String,
    #[allow(clippy::type_complexity)]
    handler: Arc<
        dyn for<'a> Fn(&'a mut T, &'a mut MessageIo<T>, &'a mut BlockMeta, Pmt) -> Result<Pmt>
            + Send
            + Sync,
    >,
}

impl<T: Send + ?Sized> SyncMessageInput<T> {
    #[allow(clippy::type_complexity)]
    fn new(
        name: &str,
        handler: Arc<
            dyn for<'a> Fn(&'a mut T, &'a mut MessageIo<T>, &'a mut BlockMeta, Pmt) -> Result<Pmt>
                + Send
                + Sync,
        >,
    ) -> SyncMessageInput<T> {
        SyncMessageInput {
            name: name.to_string(),
            handler,
        }
    }

    /// Get the handler
    #[allow(clippy::type_complexity)]
    pub fn get_handler(
        &self,
    ) -> Arc<
        dyn for<'a> Fn(&'a mut T, &'a mut MessageIo<T>, &'a mut BlockMeta, Pmt) -> Result<Pmt>
            + Send
            + Sync,
    > {
        self.handler.clone()
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Message input port with an async handler
pub struct AsyncMessageInput<T: Send + ?Sized> {
    name: String,
    #[allow(clippy::type_complexity)]
    handler: Arc<
        dyn for<'a> Fn(
                &'a mut T,
                &'a mut MessageIo<T>,
                &'a mut BlockMeta,
                Pmt,
            ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>>
            + Send
            + Sync,
    >,
}

impl<T: Send + ?Sized> AsyncMessageInput<T> {
    #[allow(clippy::type_complexity)]
    fn new(
        name: &str,
        handler: Arc<
            dyn for<'a> Fn(
                    &'a mut T,
                    &'a mut MessageIo<T>,
                    &'a mut BlockMeta,
                    Pmt,
                ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>>
                + Send
                + Sync,
        >,
    ) -> AsyncMessageInput<T> {
        AsyncMessageInput {
            name: name.to_string(),
            handler,
        }
    }

    /// Get the handler
    #[allow(clippy::type_complexity)]
    pub fn get_handler(
        &self,
    ) -> Arc<
        dyn for<'a> Fn(
                &'a mut T,
                &'a mut MessageIo<T>,
                &'a mut BlockMeta,
                Pmt,
            ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>>
            + Send
            + Sync,
    > {
        self.handler.clone()
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Message output port
#[derive(Debug)]
pub struct MessageOutput {
    name: String,
    handlers: Vec<(usize, Sender<BlockMessage>)>,
}

impl MessageOutput {
    /// Create port
    pub fn new(name: &str) -> MessageOutput {
        MessageOutput {
            name: name.to_string(),
            handlers: Vec::new(),
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect the port to the given handler of a remote block
    pub fn connect(&mut self, port: usize, sender: Sender<BlockMessage>) {
        self.handlers.push((port, sender));
    }

    /// Tell connected blocks that we are finished
    pub async fn notify_finished(&mut self) {
        for (_, sender) in self.handlers.iter_mut() {
            if sender.send(BlockMessage::Terminate).await.is_err() {
                debug!("receiver of message output already terminated");
            }
        }
    }

    /// Post a message to connected handlers
    pub async fn post(&mut self, p: Pmt) {
        for (port_id, sender) in self.handlers.iter_mut() {
            if sender
                .send(BlockMessage::Call {
                    port_id: PortId::Index(*port_id),
                    data: p.clone(),
                })
                .await
                .is_err()
            {
                debug!("receiver of message output already terminated");
            }
        }
    }
}

/// Message ports of a block
pub struct MessageIo<T: Send + ?Sized> {
    inputs: Vec<MessageInput<T>>,
    outputs: Vec<MessageOutput>,
}

impl<T: Send> MessageIo<T> {
    fn new(inputs: Vec<MessageInput<T>>, outputs: Vec<MessageOutput>) -> Self {
        MessageIo { inputs, outputs }
    }

    /// Resolve a [`PortId`] to the input index, if it exists
    pub fn input_id(&self, id: &PortId) -> Option<usize> {
        match id {
            PortId::Index(i) => (*i < self.inputs.len()).then_some(*i),
            PortId::Name(n) => self.input_name_to_id(n),
        }
    }

    /// Is the given input handler async
    pub fn input_is_async(&self, id: usize) -> bool {
        matches!(self.inputs[id], MessageInput::Async(_))
    }

    /// Map an input port name to its id
    pub fn input_name_to_id(&self, name: &str) -> Option<usize> {
        self.inputs
            .iter()
            .enumerate()
            .find(|item| item.1.name() == name)
            .map(|(i, _)| i)
    }

    /// Get input port
    pub fn input(&self, id: usize) -> &MessageInput<T> {
        &self.inputs[id]
    }

    /// Names of the input ports
    pub fn input_names(&self) -> Vec<String> {
        self.inputs.iter().map(|i| i.name().to_string()).collect()
    }

    /// Get output ports
    pub fn outputs(&self) -> &Vec<MessageOutput> {
        &self.outputs
    }

    /// Get output ports mutably
    pub fn outputs_mut(&mut self) -> &mut Vec<MessageOutput> {
        &mut self.outputs
    }

    /// Get output port
    pub fn output(&self, id: usize) -> &MessageOutput {
        &self.outputs[id]
    }

    /// Get output port mutably
    pub fn output_mut(&mut self, id: usize) -> &mut MessageOutput {
        &mut self.outputs[id]
    }

    /// Map an output port name to its id
    pub fn output_name_to_id(&self, name: &str) -> Option<usize> {
        self.outputs
            .iter()
            .enumerate()
            .find(|item| item.1.name() == name)
            .map(|(i, _)| i)
    }

    /// Post a message to the handlers connected to the given output
    pub async fn post(&mut self, id: usize, p: Pmt) {
        self.output_mut(id).post(p).await;
    }
}

/// Builder for [`MessageIo`]
pub struct MessageIoBuilder<T: Send> {
    inputs: Vec<MessageInput<T>>,
    outputs: Vec<MessageOutput>,
}

impl<T: Send> MessageIoBuilder<T> {
    /// Create builder
    pub fn new() -> MessageIoBuilder<T> {
        MessageIoBuilder {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input port with an async handler
    ///
    /// Handlers can only be added during construction.
    #[must_use]
    pub fn add_async_input(
        mut self,
        name: &str,
        c: impl for<'a> Fn(
                &'a mut T,
                &'a mut MessageIo<T>,
                &'a mut BlockMeta,
                Pmt,
            ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>>
            + Send
            + Sync
            + 'static,
    ) -> MessageIoBuilder<T> {
        self.inputs.push(MessageInput::Async(AsyncMessageInput::new(
            name,
            Arc::new(c),
        )));
        self
    }

    /// Add an input port with a sync handler
    #[must_use]
    pub fn add_sync_input(
        mut self,
        name: &str,
        c: impl for<'a> Fn(&'a mut T, &'a mut MessageIo<T>, &'a mut BlockMeta, Pmt) -> Result<Pmt>
            + Send
            + Sync
            + 'static,
    ) -> MessageIoBuilder<T> {
        self.inputs
            .push(MessageInput::Sync(SyncMessageInput::new(name, Arc::new(c))));
        self
    }

    /// Add an output port
    #[must_use]
    pub fn add_output(mut self, name: &str) -> MessageIoBuilder<T> {
        self.outputs.push(MessageOutput::new(name));
        self
    }

    /// Build [`MessageIo`]
    pub fn build(self) -> MessageIo<T> {
        MessageIo::new(self.inputs, self.outputs)
    }
}

impl<T: Send> Default for MessageIoBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
