use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Sender};
use log::debug;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// One table line: the document's base name followed by its identifiers
pub fn format_corpus_line<S: AsRef<str>>(document_stem: &str, identifiers: &[S]) -> String {
    let mut line = document_stem.to_string();
    for identifier in identifiers {
        line.push(' ');
        line.push_str(identifier.as_ref());
    }
    line
}

/// Append-only identifier table shared by all document workers.
///
/// Lines go through a bounded channel to a single writer thread, so
/// concurrent workers never interleave partial lines.
pub struct CorpusWriter {
    path: PathBuf,
    sender: Sender<String>,
    writer_thread: JoinHandle<Result<usize>>,
}

impl CorpusWriter {
    /// Open (or create) the table in append mode and start the writer thread
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create corpus directory: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open corpus table: {}", path.display()))?;

        let (sender, receiver) = bounded::<String>(capacity.max(1));
        let thread_path = path.clone();

        let writer_thread = thread::spawn(move || -> Result<usize> {
            let mut writer = BufWriter::new(file);
            let mut count = 0;

            for line in receiver {
                writeln!(writer, "{}", line)
                    .with_context(|| format!("Failed to write to corpus table: {}", thread_path.display()))?;
                count += 1;
            }

            writer.flush()?;
            Ok(count)
        });

        Ok(Self {
            path,
            sender,
            writer_thread,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue one document's line
    pub fn append<S: AsRef<str>>(&self, document_stem: &str, identifiers: &[S]) -> Result<()> {
        let line = format_corpus_line(document_stem, identifiers);
        debug!("Corpus line: {}", line);
        self.sender
            .send(line)
            .map_err(|_| anyhow!("Corpus writer stopped: {}", self.path.display()))
    }

    /// Close the channel and wait for the writer; returns lines written
    pub fn finish(self) -> Result<usize> {
        let Self {
            sender,
            writer_thread,
            ..
        } = self;
        drop(sender);
        match writer_thread.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("Corpus writer thread panicked")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_format_corpus_line() {
        assert_eq!(
            format_corpus_line("paper1", &["@smith2020deep", "@jones2019graph"]),
            "paper1 @smith2020deep @jones2019graph"
        );
        let none: [&str; 0] = [];
        assert_eq!(format_corpus_line("empty", &none), "empty");
    }

    #[test]
    fn test_corpus_appends_across_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus");

        let writer = CorpusWriter::open(&path, 4).unwrap();
        writer.append("a", &["@x"]).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        let writer = CorpusWriter::open(&path, 4).unwrap();
        writer.append("b", &["@y", "@z"]).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        assert_eq!(fs::read_to_string(&path).unwrap(), "a @x\nb @y @z\n");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus");
        let writer = CorpusWriter::open(&path, 2).unwrap();

        (0..200).into_par_iter().for_each(|i| {
            let ids = vec![format!("@id{}a", i), format!("@id{}b", i)];
            writer.append(&format!("doc{}", i), &ids).unwrap();
        });
        assert_eq!(writer.finish().unwrap(), 200);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 200);
        for line in lines {
            let parts: Vec<&str> = line.split(' ').collect();
            let n = parts[0].trim_start_matches("doc");
            assert_eq!(parts[1], format!("@id{}a", n));
            assert_eq!(parts[2], format!("@id{}b", n));
        }
    }
}
