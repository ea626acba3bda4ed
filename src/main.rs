use anyhow::Result;

fn main() -> Result<()> {
    atmos_core::init()?;

    let mut app = match atmos_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("{}", e);
            anyhow::bail!("{}", e.user_message());
        }
    };
    app.initialize()?;

    let prefs = app.dashboard().state();
    tracing::info!(
        "Atmos ready: unit={:?}, theme={:?}, appearance={:?}",
        prefs.temperature_unit,
        prefs.theme,
        prefs.appearance()
    );

    app.shutdown()?;

    Ok(())
}
