//! Feeds a handful of chunks into a [`StreamRenderer`] and prints the
//! document after each one, so the placeholder-then-swap behaviour is
//! visible without wiring up a real transport.
//!
//! Run with: cargo run -p livellm-core --example stream_demo

use livellm_core::registry;
use livellm_core::scheduler::ImmediateScheduler;
use livellm_core::stream::StreamRenderer;

fn main() {
    let mut reg = registry::default();
    let mut renderer = StreamRenderer::new(Box::new(ImmediateScheduler::new()));

    let chunks = [
        "Here's what I found:\n\n",
        "```livellm:alert\n",
        "{\"type\":\"warning\",",
        "\"text\":\"Disk usage is above 90%\"}",
        "\n```\n\n",
        "Let me know if you'd like more detail.",
    ];

    for (i, chunk) in chunks.iter().enumerate() {
        renderer.push(chunk, &mut reg);
        println!("--- after chunk {i} ({chunk:?}) ---");
        println!("{}", renderer.document().to_html());
        println!();
    }

    renderer.end(&mut reg);
    println!("--- final ---");
    println!("{}", renderer.document().to_html());
}
