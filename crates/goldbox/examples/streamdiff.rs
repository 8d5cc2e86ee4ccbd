fn main() {
    let mut args = std::env::args();
    let _ = args.next().expect("expects `$ streamdiff <old> <new> [context]`");
    let old_path = args.next().expect("expects `$ streamdiff <old> <new> [context]`");
    let new_path = args.next().expect("expects `$ streamdiff <old> <new> [context]`");
    let context = args
        .next()
        .map(|c| c.parse::<usize>().expect("context must be a number"))
        .unwrap_or(goldbox::streamdiff::DEFAULT_CONTEXT_LINES);
    if args.next().is_some() {
        panic!("expects `$ streamdiff <old> <new> [context]`");
    }

    let old = std::io::BufReader::new(std::fs::File::open(&old_path).unwrap());
    let new = std::io::BufReader::new(std::fs::File::open(&new_path).unwrap());

    let mut output = Vec::new();
    let same = goldbox::streamdiff::StreamDiff::new()
        .context_lines(context)
        .palette(goldbox::report::Palette::auto())
        .diff(&mut output, &old_path, old, &new_path, new)
        .unwrap();
    print!("{}", String::from_utf8_lossy(&output));
    if !same {
        std::process::exit(1);
    }
}
