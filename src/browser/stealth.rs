use crate::browser::{DriverResult, PageDriver, Viewport};
use async_trait::async_trait;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Behaviour applied to a page before each city page attempt
#[async_trait]
pub trait Stealth: Send + Sync {
    async fn emulate(&self, page: &dyn PageDriver) -> DriverResult<()>;
}

/// Does nothing; keeps tests deterministic
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStealth;

#[async_trait]
impl Stealth for NoStealth {
    async fn emulate(&self, _page: &dyn PageDriver) -> DriverResult<()> {
        Ok(())
    }
}

/// Random pause, random vertical scroll, random pointer move inside the viewport
#[derive(Debug, Clone)]
pub struct HumanEmulation {
    pub pause_secs: RangeInclusive<f64>,
    pub scroll_px: RangeInclusive<i64>,
}

impl Default for HumanEmulation {
    fn default() -> Self {
        Self {
            pause_secs: 0.5..=1.5,
            scroll_px: 100..=800,
        }
    }
}

/// One draw of the random gestures
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gesture {
    pause: Duration,
    scroll: i64,
}

impl HumanEmulation {
    fn draw_gesture(&self) -> Gesture {
        let mut rng = rand::thread_rng();
        Gesture {
            pause: Duration::from_secs_f64(rng.gen_range(self.pause_secs.clone())),
            scroll: rng.gen_range(self.scroll_px.clone()),
        }
    }
}

/// Random point inside the viewport
fn pointer_target(viewport: Viewport) -> (f64, f64) {
    let mut rng = rand::thread_rng();
    let x = rng.gen_range(0..viewport.width.max(1));
    let y = rng.gen_range(0..viewport.height.max(1));
    (f64::from(x), f64::from(y))
}

#[async_trait]
impl Stealth for HumanEmulation {
    async fn emulate(&self, page: &dyn PageDriver) -> DriverResult<()> {
        let gesture = self.draw_gesture();

        tokio::time::sleep(gesture.pause).await;
        page.scroll_by(gesture.scroll).await?;

        let viewport = page.viewport().await?;
        let (x, y) = pointer_target(viewport);
        if let Err(e) = page.move_pointer(x, y).await {
            tracing::debug!("Pointer move failed: {}", e);
        }

        Ok(())
    }
}
