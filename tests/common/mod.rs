pub mod mock_adlibrary;
