use super::{Adapter, ConnectionDescriptor, Options};
use crate::{error::StoreError, Person};
use tokio::fs::OpenOptions;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes one JSON object per person, to a file (appending) or to stdout
/// when the address is `-`.
pub struct JsonLinesAdapter {
    address: String,
    options: Options,
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesAdapter {
    pub async fn new(address: &str, options: &Options) -> Result<JsonLinesAdapter, StoreError> {
        let out: Box<dyn AsyncWrite + Send + Unpin> = if address == "-" {
            Box::new(io::stdout())
        } else {
            Box::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(address)
                    .await?,
            )
        };
        Ok(JsonLinesAdapter {
            address: address.to_string(),
            options: options.clone(),
            out: Mutex::new(out),
        })
    }
}

#[async_trait::async_trait]
impl Adapter for JsonLinesAdapter {
    fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            scheme: "jsonl".to_string(),
            address: self.address.clone(),
            options: self.options.clone(),
        }
    }

    async fn save(&self, person: Person) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&person)?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}
