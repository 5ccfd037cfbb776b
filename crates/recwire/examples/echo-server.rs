//! Minimal echo server — accepts one peer and echoes messages back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! Then connect from another process, e.g. with a `MessageConnection` over
//! `WireStream::connect("127.0.0.1:<port>")`.

use recwire::frame::{Message, MessageConnection};
use recwire::transport::WireStream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    eprintln!("Listening on {}", listener.local_addr()?);

    // Accept one peer and echo messages until disconnect.
    let (stream, addr) = listener.accept()?;
    eprintln!("Peer connected: {addr}");

    let mut conn = MessageConnection::new(WireStream::from_tcp(stream));
    loop {
        match conn.read_message() {
            Ok(message) => {
                eprintln!("Received {message}");
                let reply = Message::new("echo")
                    .with_part(message.command().unwrap_or("").to_string());
                conn.write_message(&reply)?;
            }
            Err(e) => {
                eprintln!("Peer disconnected: {e}");
                break;
            }
        }
    }

    conn.close()?;
    Ok(())
}
