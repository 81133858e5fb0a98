use crate::AsyncState;
use futures_core::stream::Stream;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;
use tokio::time::Sleep;

/// Stream combinators for watching an operation's state.
pub trait AsyncStreamExt: Stream {
    /// Yield items until (and including) the first one matching `test`,
    /// then end the stream.
    ///
    /// ```
    /// use asyncop::{AsyncOperation, AsyncStreamExt};
    ///
    /// # async fn example() {
    /// let operation: AsyncOperation<u32, String> = AsyncOperation::default();
    /// let _states = operation.to_stream().stop_if(|state| state.is_error());
    /// # }
    /// ```
    fn stop_if<F>(self, test: F) -> StopIf<Self, F>
    where
        F: FnMut(&Self::Item) -> bool,
        Self: Sized,
    {
        StopIf {
            stream: self,
            stopped: false,
            test,
        }
    }

    /// Follow a state stream up to its first `Success` or `Error`.
    ///
    /// The current state is the stream's first item, so subscribe after
    /// starting the run you want to wait for.
    fn until_settled<T, E>(self) -> StopIf<Self, fn(&AsyncState<T, E>) -> bool>
    where
        Self: Stream<Item = AsyncState<T, E>> + Sized,
    {
        self.stop_if(is_settled as fn(&AsyncState<T, E>) -> bool)
    }

    /// Hold each item for `delay`; a newer item arriving meanwhile replaces
    /// it and restarts the wait, so a burst yields only its last item.
    /// When the inner stream ends, a held item is yielded at once.
    ///
    /// Needs a tokio runtime with the time driver enabled.
    fn debounce(self, delay: Duration) -> Debounce<Self>
    where
        Self: Sized,
    {
        Debounce {
            stream: self,
            delay,
            held: None,
            timer: None,
            finished: false,
        }
    }
}

impl<T: ?Sized> AsyncStreamExt for T where T: Stream {}

fn is_settled<T, E>(state: &AsyncState<T, E>) -> bool {
    state.is_complete()
}

#[pin_project(project = StopIfProj)]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct StopIf<A, B> {
    #[pin]
    stream: A,
    stopped: bool,
    test: B,
}

impl<A, B> Stream for StopIf<A, B>
where
    A: Stream,
    B: FnMut(&A::Item) -> bool,
{
    type Item = A::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let StopIfProj {
            stream,
            stopped,
            test,
        } = self.project();

        if *stopped {
            return Poll::Ready(None);
        }
        match stream.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                if test(&item) {
                    *stopped = true;
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                *stopped = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[pin_project(project = DebounceProj)]
#[must_use = "Streams do nothing unless polled"]
pub struct Debounce<A: Stream> {
    #[pin]
    stream: A,
    delay: Duration,
    held: Option<A::Item>,
    #[pin]
    timer: Option<Sleep>,
    finished: bool,
}

impl<A: Stream> Stream for Debounce<A> {
    type Item = A::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let DebounceProj {
            mut stream,
            delay,
            held,
            mut timer,
            finished,
        } = self.project();

        while !*finished {
            match stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    *held = Some(item);
                    timer.set(Some(tokio::time::sleep(*delay)));
                }
                Poll::Ready(None) => *finished = true,
                Poll::Pending => break,
            }
        }

        if *finished {
            timer.set(None);
            return Poll::Ready(held.take());
        }
        match timer.as_mut().as_pin_mut() {
            Some(sleep) => {
                ready!(sleep.poll(cx));
                timer.set(None);
                Poll::Ready(held.take())
            }
            None => Poll::Pending,
        }
    }
}
