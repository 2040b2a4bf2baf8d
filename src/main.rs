fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Non-interactive smoke test mode (for automated checks).
    // Renders a single frame for a specific page and exits 0.
    // Usage: --smoke or --smoke=source|source-format|target|target-format|planner|generating|confirm|executing|done
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--smoke" || a.starts_with("--smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        pbx_migrate::run_wizard_smoke(target);
        return;
    }

    pbx_migrate::run_wizard();
}
