use iidshuffle_core::all_sources;

pub fn run() {
    let sources = all_sources(0);

    println!("{} built-in sample source(s):\n", sources.len());
    for src in &sources {
        let info = src.info();
        let mark = if src.is_available() {
            "\u{2705}"
        } else {
            "\u{274C}"
        };
        let expect = if info.iid_expected { "IID" } else { "non-IID" };
        println!("  {mark} {:<14} {:<8} {}", info.name, expect, info.description);
    }
    println!("\nSeeded sources take --source-seed (or --seed) when collected.");
}
