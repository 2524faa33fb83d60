pub mod order_id;
