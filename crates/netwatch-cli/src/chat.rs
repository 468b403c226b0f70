//! Console chat transport.
//!
//! The real chat-platform transport is a deployment adapter; this one
//! writes every outbound message to stdout so the publication pipeline
//! can be exercised end to end from a terminal.

use async_trait::async_trait;
use netwatch_monitor::adapters::{ChatTarget, ChatTransport};
use netwatch_monitor::Result;

pub struct StdoutChat;

#[async_trait]
impl ChatTransport for StdoutChat {
    async fn send_text(&self, target: &ChatTarget, text: &str) -> Result<()> {
        println!("--- text to {target} ---");
        println!("{text}");
        Ok(())
    }

    async fn send_photo(&self, target: &ChatTarget, png: &[u8], caption: &str) -> Result<()> {
        println!("--- photo to {target} ({} bytes) ---", png.len());
        println!("{caption}");
        Ok(())
    }
}
