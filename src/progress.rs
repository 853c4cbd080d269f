// This file is part of the sgf-reader library.
// Copyright (C) 2025 The sgf-reader developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

/// Receives progress reports while a game record is read.
///
/// # Examples
///
/// ```
/// use sgf_reader::{Config, SgfReader};
///
/// let mut reports = Vec::new();
/// let _reader = SgfReader::from_bytes_with(
///     b"(;SZ[9];B[ee];W[cc])",
///     Config::default(),
///     Some(&mut |percent: u32| reports.push(percent)),
/// )?;
/// assert_eq!(reports.first(), Some(&0));
/// # Ok::<_, sgf_reader::SgfError>(())
/// ```
pub trait ProgressShow {
    /// Called with a percentage between 0 and 100.
    fn show_progress(&mut self, percent: u32);
}

impl<F: FnMut(u32)> ProgressShow for F {
    fn show_progress(&mut self, percent: u32) {
        self(percent)
    }
}

/// Turns byte counts into deduplicated percentages.
pub(crate) struct Progress<'a> {
    show: Option<&'a mut dyn ProgressShow>,
    total: Option<u64>,
    last: Option<u32>,
}

impl<'a> Progress<'a> {
    pub fn new(show: Option<&'a mut dyn ProgressShow>, total: Option<u64>) -> Progress<'a> {
        Progress {
            show,
            total,
            last: None,
        }
    }

    /// Reports 0%.
    pub fn start(&mut self) {
        self.report(0);
    }

    /// Reports progress after `count` bytes were consumed.
    pub fn update(&mut self, count: u64) {
        if self.show.is_none() {
            return;
        }
        let percent = match self.total {
            Some(total) if total > 0 => (count.min(total) * 100 / total) as u32,
            _ => 100,
        };
        self.report(percent);
    }

    /// Only increasing percentages are reported, also across a restart.
    fn report(&mut self, percent: u32) {
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        if let Some(show) = self.show.as_mut() {
            show.show_progress(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup() {
        let mut reports = Vec::new();
        let mut sink = |percent: u32| reports.push(percent);
        let mut progress = Progress::new(Some(&mut sink), Some(200));
        progress.start();
        progress.update(0);
        progress.update(1);
        progress.update(100);
        progress.update(101);
        progress.update(200);
        progress.update(500);
        drop(progress);
        assert_eq!(reports, [0, 50, 100]);
    }

    #[test]
    fn test_unknown_total() {
        let mut reports = Vec::new();
        let mut sink = |percent: u32| reports.push(percent);
        let mut progress = Progress::new(Some(&mut sink), None);
        progress.start();
        progress.update(10);
        progress.update(20);
        drop(progress);
        assert_eq!(reports, [0, 100]);
    }

    #[test]
    fn test_second_pass_is_monotonic() {
        let mut reports = Vec::new();
        let mut sink = |percent: u32| reports.push(percent);
        let mut progress = Progress::new(Some(&mut sink), Some(100));
        progress.start();
        progress.update(40);
        // Reading starts over from the first byte.
        progress.update(10);
        progress.update(40);
        progress.update(70);
        progress.update(100);
        drop(progress);
        assert_eq!(reports, [0, 40, 70, 100]);
    }
}
