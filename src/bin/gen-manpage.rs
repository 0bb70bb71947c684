//! Render the flashimg(1) man page from the clap definition
//!
//! Usage: gen-manpage [DIR]
//!
//! Without `DIR` the page is written to stdout, so it can be piped into
//! `man -l -`. With `DIR` it is written to `DIR/flashimg.1`.

use clap::CommandFactory;
use std::io::{self, Write};
use std::path::Path;

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

fn render() -> io::Result<Vec<u8>> {
    let cmd = cli::Cli::command().after_help(
        "Partition tables are text files with one 'name offset length' record \
         per line, or TOML files with [[partition]] entries.\n\
         -r and -w actions run in command line order. The image is written \
         back only when every action succeeds.",
    );
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut page)?;
    Ok(page)
}

fn main() -> io::Result<()> {
    let page = render()?;

    match std::env::args_os().nth(1) {
        Some(dir) => {
            let dir = Path::new(&dir);
            std::fs::create_dir_all(dir)?;
            let path = dir.join("flashimg.1");
            std::fs::write(&path, page)?;
            eprintln!("Man page written to {}", path.display());
        }
        None => io::stdout().lock().write_all(&page)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_lists_options() {
        let page = String::from_utf8(render().unwrap()).unwrap();
        assert!(page.contains("flashimg"));
        assert!(page.contains("strict"));
        assert!(page.contains("PARTITION,FILE"));
    }
}
