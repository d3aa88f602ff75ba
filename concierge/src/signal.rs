use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Listener<T> = Rc<dyn Fn(&T)>;

/// An observable value owned by whoever created it.
///
/// Listeners are kept on the signal itself rather than in a global effect
/// table, so dropping every clone of the signal drops its listeners too.
pub struct Signal<T: 'static + Clone> {
    value: Rc<RefCell<T>>,
    listeners: Rc<RefCell<Vec<(usize, Listener<T>)>>>,
    next_id: Rc<Cell<usize>>,
}

impl<T: 'static + Clone> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            listeners: self.listeners.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T: 'static + Clone> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Rc::new(Cell::new(0)),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Read without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, new_value: T) {
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    pub fn update<F: FnOnce(&T) -> T>(&self, f: F) {
        let new_value = f(&self.value.borrow());
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    /// Register a listener called after every `set`/`update`. Returns an id
    /// for [`Signal::unsubscribe`].
    pub fn subscribe<F: Fn(&T) + 'static>(&self, f: F) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: usize) {
        self.listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&self) {
        // Snapshot so listeners may subscribe or set again.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        let value = self.get();

        for listener in listeners {
            listener(&value);
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + fmt::Display + 'static> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.borrow().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_notifies_listeners() {
        let signal = Signal::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let id = {
            let seen = seen.clone();
            signal.subscribe(move |value| seen.borrow_mut().push(*value))
        };

        signal.set(2);
        signal.update(|value| value * 10);
        assert_eq!(*seen.borrow(), vec![2, 20]);

        signal.unsubscribe(id);
        signal.set(3);
        assert_eq!(*seen.borrow(), vec![2, 20]);
        assert_eq!(signal.get(), 3);
    }

    #[test]
    fn test_listener_may_read_signal() {
        let signal = Signal::new(String::from("index"));
        let echoed = Rc::new(RefCell::new(String::new()));

        {
            let echoed = echoed.clone();
            let inner = signal.clone();
            signal.subscribe(move |_| *echoed.borrow_mut() = inner.get());
        }

        signal.set("gym".to_owned());
        assert_eq!(*echoed.borrow(), "gym");
        assert_eq!(signal.to_string(), "gym");
    }
}
