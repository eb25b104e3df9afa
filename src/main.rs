use plex_mirror::run;

fn main() -> anyhow::Result<()> {
    // Traversal is sequential; one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
