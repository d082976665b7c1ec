fn main() -> anyhow::Result<()> {
    atoll::run()
}
