//! Chat with the noLimit LLM, paying per message over x402

use nolimit_solana::{ChatMessage, ChatOptions, ClientConfig, KeypairSigner, NoLimitClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    let client = match config.api_key.clone() {
        Some(_) => NoLimitClient::builder(config).build()?,
        None => NoLimitClient::new(KeypairSigner::from_env("SOLANA_PRIVATE_KEY")?, config)?,
    };

    if let Some(address) = client.pubkey() {
        println!("Paying from {}", address);
    }

    let question = "What makes Solana fast?";
    let first = client.chat().send(question).await?;
    println!("> {}\n{}", question, first.message);
    if let Some(receipt) = &first.payment_receipt {
        println!("Payment receipt: {}", receipt);
    }

    let follow_up = "How does that compare to Ethereum?";
    let options = ChatOptions {
        history: vec![
            ChatMessage::user(question),
            ChatMessage::assistant(first.message),
        ],
        timeout: None,
    };
    let second = client.chat().send_with_options(follow_up, options).await?;
    println!("\n> {}\n{}", follow_up, second.message);

    Ok(())
}
