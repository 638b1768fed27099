// File: src/parser/emit.rs
//! Writing previews to the client as they are produced.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// How consecutive documents are separated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Documents written back to back with no delimiter. Existing clients
    /// parse each write on its own.
    #[default]
    Concatenated,
    /// One document per line.
    Lines,
}

/// Sink for serialized drafts. Each call is one discrete write.
pub trait Emitter: Send {
    fn emit(&mut self, document: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Emits into any async writer, flushing after every document.
#[derive(Debug)]
pub struct WriterEmitter<W> {
    writer: W,
    framing: Framing,
}

impl<W> WriterEmitter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, framing: Framing) -> Self {
        Self { writer, framing }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> Emitter for WriterEmitter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, document: &str) -> Result<()> {
        self.writer.write_all(document.as_bytes()).await?;
        if self.framing == Framing::Lines {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}

/// Keeps every write in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingEmitter {
    pub documents: Vec<String>,
}

impl Emitter for CollectingEmitter {
    async fn emit(&mut self, document: &str) -> Result<()> {
        self.documents.push(document.to_string());
        Ok(())
    }
}
