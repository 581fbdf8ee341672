fn main() -> anyhow::Result<()> {
    watchdogs_lib::run()
}
