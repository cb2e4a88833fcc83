//! Create a mix and follow its progress

use std::time::Duration;

use nolimit_solana::{ClientConfig, KeypairSigner, MixParams, NoLimitClient, Token};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let recipient = std::env::var("MIX_RECIPIENT")?;
    let signer = KeypairSigner::from_env("SOLANA_PRIVATE_KEY")?;
    let client = NoLimitClient::new(signer, ClientConfig::from_env()?)?;

    let amount = "0.5";
    let (fee, output) = client.mixer().calculate_fee(amount)?;
    println!("Mixing {} SOL: fee {}, recipient gets {}", amount, fee, output);

    let mix = client
        .mixer()
        .create(&MixParams::new(Token::Sol, amount, recipient).with_delay_minutes(5))
        .await?;
    println!("Deposit {} SOL to {}", mix.deposit_amount, mix.deposit_address);
    if let Some(expires_at) = &mix.expires_at {
        println!("Deposit window closes at {}", expires_at);
    }

    loop {
        let status = client.mixer().status(&mix.mix_id).await?;
        println!(
            "{:?}: {}% (hop {}/{})",
            status.status, status.progress, status.current_hop, status.total_hops
        );
        if status.status.is_terminal() {
            if let Some(signature) = status.output_signature {
                println!("Payout: {}", signature);
            }
            if let Some(error) = status.error {
                println!("Mix failed: {}", error);
            }
            break;
        }
        tokio::time::sleep(Duration::from_secs(15)).await;
    }

    Ok(())
}
