use error_stack::Report;
use spotify_login::{run, Config, LoginError, StdinInput};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Report<LoginError>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    run(&config, &mut StdinInput).await?;

    Ok(())
}
