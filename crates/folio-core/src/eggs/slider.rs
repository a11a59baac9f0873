/// Image slider modal. Slide indices are 1-based.
#[derive(Debug)]
pub struct SlideShow {
    count: usize,
    current: usize,
    open: bool,
}

impl SlideShow {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            current: 1,
            open: false,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Returns true if the slider was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Step by `direction`, wrapping past either end.
    pub fn change(&mut self, direction: i64) -> usize {
        if self.count == 0 {
            return self.current;
        }
        let next = self.current as i64 + direction;
        self.current = if next > self.count as i64 {
            1
        } else if next < 1 {
            self.count
        } else {
            next as usize
        };
        self.current
    }

    /// Jump to a slide. Out-of-range indices are ignored.
    pub fn jump(&mut self, index: usize) -> Option<usize> {
        if (1..=self.count).contains(&index) {
            self.current = index;
            Some(index)
        } else {
            None
        }
    }
}
