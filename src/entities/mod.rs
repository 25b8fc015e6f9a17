pub mod address;
pub mod cart_item;
pub mod customer;
pub mod delivery_agent;
pub mod order;
pub mod order_status_history;

pub use address::Entity as Address;
pub use cart_item::Entity as CartItem;
pub use customer::Entity as Customer;
pub use delivery_agent::Entity as DeliveryAgent;
pub use order::Entity as Order;
pub use order_status_history::Entity as OrderStatusHistory;
