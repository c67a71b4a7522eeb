//! Batching of token sequences into a padded 2-D array.

use ndarray::Array2;

/// A padded batch and the valid length of each row.
#[derive(Debug, Clone, PartialEq)]
pub struct Collated {
    /// `[batch, max_len]`.
    pub tokens: Array2<i64>,
    pub lens: Vec<usize>,
}

impl Collated {
    /// Valid length of the first row (0 for an empty batch).
    pub fn first_len(&self) -> usize {
        self.lens.first().copied().unwrap_or(0)
    }
}

/// Pads rows to the longest one, optionally framing each with BOS/EOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCollater {
    pub pad_id: i64,
    pub bos_id: Option<i64>,
    pub eos_id: Option<i64>,
}

impl Default for TextCollater {
    fn default() -> Self {
        Self {
            pad_id: 0,
            bos_id: None,
            eos_id: None,
        }
    }
}

impl TextCollater {
    pub fn collate(&self, seqs: &[&[i64]]) -> Collated {
        let framed: Vec<Vec<i64>> = seqs
            .iter()
            .map(|s| {
                self.bos_id
                    .into_iter()
                    .chain(s.iter().copied())
                    .chain(self.eos_id)
                    .collect()
            })
            .collect();

        let lens: Vec<usize> = framed.iter().map(Vec::len).collect();
        let max_len = lens.iter().copied().max().unwrap_or(0);

        let mut tokens = Array2::from_elem((framed.len(), max_len), self.pad_id);
        for (mut row, seq) in tokens.outer_iter_mut().zip(&framed) {
            for (dst, &src) in row.iter_mut().zip(seq) {
                *dst = src;
            }
        }
        Collated { tokens, lens }
    }

    pub fn collate_one(&self, seq: &[i64]) -> Collated {
        self.collate(&[seq])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn pads_to_longest_row() {
        let c = TextCollater::default().collate(&[&[1, 2, 3], &[4]]);
        assert_eq!(c.tokens, array![[1_i64, 2, 3], [4, 0, 0]]);
        assert_eq!(c.lens, vec![3, 1]);
    }

    #[test]
    fn bos_and_eos_frame_each_row() {
        let collater = TextCollater {
            pad_id: -1,
            bos_id: Some(100),
            eos_id: Some(101),
        };
        let c = collater.collate(&[&[5], &[6, 7]]);
        assert_eq!(c.tokens, array![[100_i64, 5, 101, -1], [100, 6, 7, 101]]);
        assert_eq!(c.lens, vec![3, 4]);
    }

    #[test]
    fn empty_batch() {
        let c = TextCollater::default().collate(&[]);
        assert_eq!(c.tokens.dim(), (0, 0));
        assert_eq!(c.first_len(), 0);
    }

    #[test]
    fn single_row() {
        let c = TextCollater::default().collate_one(&[9, 8]);
        assert_eq!(c.tokens, array![[9_i64, 8]]);
        assert_eq!(c.first_len(), 2);
    }
}
