fn main() -> anyhow::Result<()> {
    gonogo_lib::run()
}
