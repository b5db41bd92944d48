use crate::models::Banner;

/// Rotating promotional banners, ordered by `display_order`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BannerCarousel {
    banners: Vec<Banner>,
    index: usize,
}

impl BannerCarousel {
    /// Inactive banners are dropped.
    pub fn new(banners: Vec<Banner>) -> Self {
        let mut banners: Vec<Banner> = banners.into_iter().filter(|b| b.is_active).collect();
        banners.sort_by_key(|b| b.display_order);
        Self { banners, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.banners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banners.is_empty()
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub fn current(&self) -> Option<&Banner> {
        self.banners.get(self.index)
    }

    pub fn next(&mut self) -> Option<&Banner> {
        if self.banners.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.banners.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<&Banner> {
        if self.banners.is_empty() {
            return None;
        }
        self.index = (self.index + self.banners.len() - 1) % self.banners.len();
        self.current()
    }

    /// Auto-rotation only makes sense with more than one banner.
    pub fn rotates(&self) -> bool {
        self.banners.len() > 1
    }
}
