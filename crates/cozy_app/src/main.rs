fn main() -> miette::Result<()> {
    cozy_app::start_cozy_markers()
}
