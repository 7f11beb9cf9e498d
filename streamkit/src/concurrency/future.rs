use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, ready};
use pin_project_lite::pin_project;

pin_project! {
    /// Slot holding at most one in-flight future.
    ///
    /// Polling an idle slot stays pending forever, which makes it usable as a `tokio::select!`
    /// branch that only fires while something is running. Once the inner future completes the
    /// slot becomes idle again, so a finished future is never polled twice.
    #[must_use = "futures do nothing unless polled"]
    #[derive(Debug)]
    pub struct InFlight<F> {
        #[pin]
        slot: Option<F>,
    }
}

impl<F> InFlight<F> {
    /// Creates an idle slot.
    pub const fn idle() -> Self {
        Self { slot: None }
    }

    /// Returns `true` while a future is in the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    /// Puts `future` in the slot, dropping whatever was running before.
    pub fn start(self: Pin<&mut Self>, future: F) {
        self.project().slot.set(Some(future));
    }
}

impl<F> Future for InFlight<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        let Some(inner) = this.slot.as_mut().as_pin_mut() else {
            return Poll::Pending;
        };

        let output = ready!(inner.poll(cx));
        this.slot.set(None);

        Poll::Ready(output)
    }
}
