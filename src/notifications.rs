use tracing::info;

/// A user-facing transient notice about a cart mutation, the server-side
/// counterpart of the site's toast messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    ItemAdded { product_name: String },
    ItemRemoved { product_name: String },
    QuantityUpdated { product_name: String, quantity: u32 },
    Cleared,
}

/// Channel for delivering [`CartNotice`]s to the user.
///
/// Injected explicitly into the session service; when no notifier is
/// configured the cart behaves identically and stays silent.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: CartNotice);
}

/// Notifier that writes notices to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: CartNotice) {
        match notice {
            CartNotice::ItemAdded { product_name } => {
                info!(%product_name, "Added to cart");
            }
            CartNotice::ItemRemoved { product_name } => {
                info!(%product_name, "Removed from cart");
            }
            CartNotice::QuantityUpdated {
                product_name,
                quantity,
            } => {
                info!(%product_name, quantity, "Cart quantity updated");
            }
            CartNotice::Cleared => {
                info!("Cart cleared");
            }
        }
    }
}
