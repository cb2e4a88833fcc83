//! Quote a swap on Jupiter, then execute it through noLimit

use nolimit_solana::{ClientConfig, KeypairSigner, NoLimitClient, SwapParams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let signer = KeypairSigner::from_env("SOLANA_PRIVATE_KEY")?;
    let client = NoLimitClient::new(signer, ClientConfig::from_env()?)?;

    let params = SwapParams::new("SOL", "USDC", "0.01").with_slippage_bps(100);
    let quote = client.swap().quote(&params).await?;
    println!(
        "Quote: {} lamports -> {} USDC atomic units (impact {:.4}%)",
        quote.in_amount, quote.out_amount, quote.price_impact_pct
    );

    if std::env::var("EXECUTE_SWAP").as_deref() != Ok("1") {
        println!("Set EXECUTE_SWAP=1 to submit the swap");
        return Ok(());
    }

    let result = client.swap().execute(&params).await?;
    println!("Submitted: https://solscan.io/tx/{}", result.signature);
    println!("Received: {} (rewards: {} $NL)", result.out_amount, result.nl_rewards);

    Ok(())
}
